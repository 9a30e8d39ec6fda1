//! Departments, positions and candidates.
//!
//! Deleting a department or position cascades through the schema's
//! foreign keys down to candidates and their bets.

use sqlx::SqliteConnection;
use tracing::info;

use super::{Store, CANDIDATE_COLUMNS};
use crate::types::{
    Candidate, CandidateUpdate, CatalogSummary, Department, MarketError, NewCandidate,
    NewDepartment, NewPosition, Position, DEFAULT_PHOTO,
};

const POSITION_COLUMNS: &str =
    "id, title, cor_code, total_employees, positions_to_cut, department_id";

pub(crate) async fn fetch_candidate(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Candidate>, sqlx::Error> {
    let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?");
    sqlx::query_as::<_, Candidate>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub(crate) async fn set_candidate_laid_off(
    conn: &mut SqliteConnection,
    id: i64,
    laid_off: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE candidates SET is_laid_off = ? WHERE id = ?")
        .bind(laid_off)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Store {
    // -- Departments --------------------------------------------------------

    pub async fn create_department(&self, new: &NewDepartment) -> Result<Department, MarketError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(MarketError::InvalidInput("department name is required".into()));
        }
        let dept = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name, code) VALUES (?, ?) RETURNING id, name, code",
        )
        .bind(name)
        .bind(clean_optional(new.code.clone()))
        .fetch_one(self.pool())
        .await?;
        info!(department_id = dept.id, name = %dept.name, "Department added");
        Ok(dept)
    }

    pub async fn department(&self, id: i64) -> Result<Option<Department>, MarketError> {
        Ok(
            sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn departments(&self) -> Result<Vec<Department>, MarketError> {
        Ok(
            sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments ORDER BY id")
                .fetch_all(self.pool())
                .await?,
        )
    }

    pub async fn update_department(
        &self,
        id: i64,
        new: &NewDepartment,
    ) -> Result<Department, MarketError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(MarketError::InvalidInput("department name is required".into()));
        }
        sqlx::query_as::<_, Department>(
            "UPDATE departments SET name = ?, code = ? WHERE id = ? RETURNING id, name, code",
        )
        .bind(name)
        .bind(clean_optional(new.code.clone()))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| MarketError::not_found("department", id))
    }

    /// Delete a department with all its positions, candidates and bets.
    pub async fn delete_department(&self, id: i64) -> Result<(), MarketError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("department", id));
        }
        info!(department_id = id, "Department deleted");
        Ok(())
    }

    // -- Positions ----------------------------------------------------------

    pub async fn create_position(&self, new: &NewPosition) -> Result<Position, MarketError> {
        new.validate()?;
        if self.department(new.department_id).await?.is_none() {
            return Err(MarketError::not_found("department", new.department_id));
        }
        let mut conn = self.pool().acquire().await?;
        let pos = insert_position(&mut conn, new.department_id, new).await?;
        info!(position_id = pos.id, title = %pos.title, department_id = pos.department_id, "Position added");
        Ok(pos)
    }

    pub async fn position(&self, id: i64) -> Result<Option<Position>, MarketError> {
        let sql = format!("SELECT {POSITION_COLUMNS} FROM positions WHERE id = ?");
        Ok(sqlx::query_as::<_, Position>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn positions(&self) -> Result<Vec<Position>, MarketError> {
        let sql = format!("SELECT {POSITION_COLUMNS} FROM positions ORDER BY id");
        Ok(sqlx::query_as::<_, Position>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn positions_in_department(
        &self,
        department_id: i64,
    ) -> Result<Vec<Position>, MarketError> {
        let sql =
            format!("SELECT {POSITION_COLUMNS} FROM positions WHERE department_id = ? ORDER BY id");
        Ok(sqlx::query_as::<_, Position>(&sql)
            .bind(department_id)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn update_position(&self, id: i64, new: &NewPosition) -> Result<Position, MarketError> {
        new.validate()?;
        if self.department(new.department_id).await?.is_none() {
            return Err(MarketError::not_found("department", new.department_id));
        }
        let sql = format!(
            "UPDATE positions SET title = ?, cor_code = ?, total_employees = ?, \
             positions_to_cut = ?, department_id = ? WHERE id = ? RETURNING {POSITION_COLUMNS}"
        );
        sqlx::query_as::<_, Position>(&sql)
            .bind(new.title.trim())
            .bind(clean_optional(new.cor_code.clone()))
            .bind(new.total_employees)
            .bind(new.positions_to_cut)
            .bind(new.department_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("position", id))
    }

    /// Record how many seats of a position are being eliminated.
    pub async fn set_positions_to_cut(&self, id: i64, cuts: i64) -> Result<Position, MarketError> {
        let current = self
            .position(id)
            .await?
            .ok_or_else(|| MarketError::not_found("position", id))?;
        if cuts < 0 || cuts > current.total_employees {
            return Err(MarketError::InvalidInput(format!(
                "cuts must be between 0 and {}, got {cuts}",
                current.total_employees
            )));
        }
        let sql = format!(
            "UPDATE positions SET positions_to_cut = ? WHERE id = ? RETURNING {POSITION_COLUMNS}"
        );
        let pos = sqlx::query_as::<_, Position>(&sql)
            .bind(cuts)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("position", id))?;
        info!(position_id = id, title = %pos.title, cuts, "Position cuts updated");
        Ok(pos)
    }

    pub async fn delete_position(&self, id: i64) -> Result<(), MarketError> {
        let result = sqlx::query("DELETE FROM positions WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("position", id));
        }
        info!(position_id = id, "Position deleted");
        Ok(())
    }

    // -- Candidates ---------------------------------------------------------

    pub async fn create_candidate(&self, new: &NewCandidate) -> Result<Candidate, MarketError> {
        new.validate()?;
        if self.position(new.position_id).await?.is_none() {
            return Err(MarketError::not_found("position", new.position_id));
        }
        let sql = format!(
            "INSERT INTO candidates (name, photo, odds, bio, is_laid_off, position_id) \
             VALUES (?, ?, ?, ?, 0, ?) RETURNING {CANDIDATE_COLUMNS}"
        );
        let cand = sqlx::query_as::<_, Candidate>(&sql)
            .bind(new.name.trim())
            .bind(new.photo.as_deref().unwrap_or(DEFAULT_PHOTO))
            .bind(new.odds.to_string())
            .bind(clean_optional(new.bio.clone()))
            .bind(new.position_id)
            .fetch_one(self.pool())
            .await?;
        info!(candidate_id = cand.id, name = %cand.name, odds = %cand.odds, "Candidate added to the pool");
        Ok(cand)
    }

    pub async fn candidate(&self, id: i64) -> Result<Option<Candidate>, MarketError> {
        let mut conn = self.pool().acquire().await?;
        Ok(fetch_candidate(&mut conn, id).await?)
    }

    pub async fn candidate_by_name(&self, name: &str) -> Result<Option<Candidate>, MarketError> {
        let sql =
            format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE name = ? ORDER BY id LIMIT 1");
        Ok(sqlx::query_as::<_, Candidate>(&sql)
            .bind(name.trim())
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn candidates(&self) -> Result<Vec<Candidate>, MarketError> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY id");
        Ok(sqlx::query_as::<_, Candidate>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn candidates_in_position(
        &self,
        position_id: i64,
    ) -> Result<Vec<Candidate>, MarketError> {
        let sql =
            format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE position_id = ? ORDER BY id");
        Ok(sqlx::query_as::<_, Candidate>(&sql)
            .bind(position_id)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn candidates_in_department(
        &self,
        department_id: i64,
    ) -> Result<Vec<Candidate>, MarketError> {
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates \
             WHERE position_id IN (SELECT id FROM positions WHERE department_id = ?) \
             ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Candidate>(&sql)
            .bind(department_id)
            .fetch_all(self.pool())
            .await?)
    }

    /// Apply a partial edit. The laid-off flag is not editable here; it
    /// belongs to the settlement engine.
    pub async fn update_candidate(
        &self,
        id: i64,
        update: &CandidateUpdate,
    ) -> Result<Candidate, MarketError> {
        update.validate()?;
        let current = self
            .candidate(id)
            .await?
            .ok_or_else(|| MarketError::not_found("candidate", id))?;
        if let Some(position_id) = update.position_id {
            if self.position(position_id).await?.is_none() {
                return Err(MarketError::not_found("position", position_id));
            }
        }

        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.name)
            .to_string();
        let bio = match &update.bio {
            Some(bio) => clean_optional(Some(bio.clone())),
            None => current.bio.clone(),
        };
        let odds = update.odds.unwrap_or(current.odds);
        let photo = update.photo.clone().unwrap_or(current.photo.clone());
        let position_id = update.position_id.unwrap_or(current.position_id);

        let sql = format!(
            "UPDATE candidates SET name = ?, bio = ?, odds = ?, photo = ?, position_id = ? \
             WHERE id = ? RETURNING {CANDIDATE_COLUMNS}"
        );
        let cand = sqlx::query_as::<_, Candidate>(&sql)
            .bind(name)
            .bind(bio)
            .bind(odds.to_string())
            .bind(photo)
            .bind(position_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| MarketError::not_found("candidate", id))?;
        info!(candidate_id = id, odds = %cand.odds, "Candidate updated");
        Ok(cand)
    }

    /// Remove a candidate and every bet on it.
    pub async fn delete_candidate(&self, id: i64) -> Result<(), MarketError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::not_found("candidate", id));
        }
        info!(candidate_id = id, "Candidate removed from the pool");
        Ok(())
    }

    // -- Aggregates ---------------------------------------------------------

    pub async fn catalog_summary(&self) -> Result<CatalogSummary, MarketError> {
        let summary = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
            "SELECT \
               (SELECT COUNT(*) FROM departments), \
               (SELECT COUNT(*) FROM positions), \
               (SELECT COUNT(*) FROM candidates), \
               (SELECT COUNT(*) FROM users), \
               (SELECT COUNT(*) FROM bets), \
               (SELECT COALESCE(SUM(total_employees), 0) FROM positions), \
               (SELECT COALESCE(SUM(positions_to_cut), 0) FROM positions)",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(CatalogSummary {
            departments: summary.0,
            positions: summary.1,
            candidates: summary.2,
            users: summary.3,
            bets: summary.4,
            total_employees: summary.5,
            total_to_cut: summary.6,
        })
    }

    /// Insert departments with their positions in one transaction.
    ///
    /// The `department_id` on each position is ignored and replaced by the
    /// id of the department it is listed under.
    pub async fn insert_catalog(
        &self,
        catalog: &[(NewDepartment, Vec<NewPosition>)],
    ) -> Result<(usize, usize), MarketError> {
        let mut tx = self.begin().await?;
        let mut positions = 0;

        for (dept, dept_positions) in catalog {
            let dept_id: i64 =
                sqlx::query_scalar("INSERT INTO departments (name, code) VALUES (?, ?) RETURNING id")
                    .bind(dept.name.trim())
                    .bind(clean_optional(dept.code.clone()))
                    .fetch_one(&mut *tx)
                    .await?;

            for pos in dept_positions {
                pos.validate()?;
                insert_position(&mut tx, dept_id, pos).await?;
                positions += 1;
            }
        }

        tx.commit().await?;
        Ok((catalog.len(), positions))
    }
}

async fn insert_position(
    conn: &mut SqliteConnection,
    department_id: i64,
    new: &NewPosition,
) -> Result<Position, sqlx::Error> {
    let sql = format!(
        "INSERT INTO positions (title, cor_code, total_employees, positions_to_cut, department_id) \
         VALUES (?, ?, ?, ?, ?) RETURNING {POSITION_COLUMNS}"
    );
    sqlx::query_as::<_, Position>(&sql)
        .bind(new.title.trim())
        .bind(clean_optional(new.cor_code.clone()))
        .bind(new.total_employees)
        .bind(new.positions_to_cut)
        .bind(department_id)
        .fetch_one(conn)
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
