//! Users and bets.
//!
//! The connection-level functions take a `&mut SqliteConnection` so the
//! wager and settlement engine can chain them inside one transaction.
//! Each balance or flag change is guarded in its `WHERE` clause, which keeps
//! it atomic even if another request touches the same row.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{decode_decimal, Store, BET_COLUMNS};
use crate::types::{
    Bet, LeaderboardEntry, MarketError, User, UserProfile, MAX_USERNAME_LEN, STARTING_COINS,
};

/// Upper bound on a single leaderboard page.
pub const MAX_LEADERBOARD_LIMIT: i64 = 500;

/// A bet flipped to resolved/won by [`resolve_open_bets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub bet_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub odds_at_bet: rust_decimal::Decimal,
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

pub(crate) async fn fetch_user(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, coins, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Take `amount` from a user's balance if they can cover it.
/// Returns the new balance, or `None` when the guard rejected the debit.
pub(crate) async fn debit_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE users SET coins = coins - ?1 WHERE id = ?2 AND coins >= ?1 RETURNING coins",
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Add a non-negative `amount` to a user's balance. Returns the new balance.
///
/// Returns `None` if the user is missing or the sum would not fit in an
/// `i64`; SQLite would otherwise silently turn the balance into a REAL.
pub(crate) async fn credit_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE users SET coins = coins + ? WHERE id = ? AND coins <= ? RETURNING coins",
    )
    .bind(amount)
    .bind(user_id)
    .bind(i64::MAX.saturating_sub(amount))
    .fetch_optional(conn)
    .await
}

/// Insert an unresolved bet, copying the candidate's live odds.
///
/// Nothing is inserted if the candidate is missing or already laid off.
pub(crate) async fn insert_open_bet(
    conn: &mut SqliteConnection,
    user_id: i64,
    candidate_id: i64,
    amount: i64,
) -> Result<Option<Bet>, sqlx::Error> {
    let sql = format!(
        "INSERT INTO bets (user_id, candidate_id, amount, odds_at_bet, is_resolved, won, created_at) \
         SELECT ?, id, ?, odds, 0, 0, ? FROM candidates WHERE id = ? AND is_laid_off = 0 \
         RETURNING {BET_COLUMNS}"
    );
    sqlx::query_as::<_, Bet>(&sql)
        .bind(user_id)
        .bind(amount)
        .bind(Utc::now())
        .bind(candidate_id)
        .fetch_optional(conn)
        .await
}

/// Mark every unresolved bet on a candidate as resolved and won.
///
/// Bets already resolved are not returned and not touched, so running this
/// twice can never pay a bet twice.
pub(crate) async fn resolve_open_bets(
    conn: &mut SqliteConnection,
    candidate_id: i64,
) -> Result<Vec<ResolvedRow>, sqlx::Error> {
    let rows: Vec<(i64, i64, i64, String)> = sqlx::query_as(
        "UPDATE bets SET is_resolved = 1, won = 1 \
         WHERE candidate_id = ? AND is_resolved = 0 \
         RETURNING id, user_id, amount, odds_at_bet",
    )
    .bind(candidate_id)
    .fetch_all(conn)
    .await?;

    let mut resolved = rows
        .into_iter()
        .map(|(bet_id, user_id, amount, odds)| {
            Ok(ResolvedRow {
                bet_id,
                user_id,
                amount,
                odds_at_bet: decode_decimal("odds_at_bet", &odds)?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    resolved.sort_by_key(|r| r.bet_id);
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Pool-level API
// ---------------------------------------------------------------------------

impl Store {
    /// Insert a new user with the starting balance.
    pub async fn create_user(&self, username: &str) -> Result<User, MarketError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(MarketError::InvalidInput("username is required".into()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(MarketError::InvalidInput(format!(
                "username longer than {MAX_USERNAME_LEN} characters"
            )));
        }

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, coins, created_at) VALUES (?, ?, ?) \
             RETURNING id, username, coins, created_at",
        )
        .bind(username)
        .bind(STARTING_COINS)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await;

        match inserted {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, coins = user.coins, "User registered");
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(username, "Username already registered");
                Err(MarketError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user(&self, id: i64) -> Result<Option<User>, MarketError> {
        let mut conn = self.pool().acquire().await?;
        Ok(fetch_user(&mut conn, id).await?)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, MarketError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, coins, created_at FROM users WHERE username = ?",
        )
        .bind(username.trim())
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    /// Richest users first. Ties go to the earlier registration.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, MarketError> {
        let limit = limit.clamp(0, MAX_LEADERBOARD_LIMIT);
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT id AS user_id, username, coins FROM users ORDER BY coins DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(entries)
    }

    pub async fn bet(&self, id: i64) -> Result<Option<Bet>, MarketError> {
        let sql = format!("SELECT {BET_COLUMNS} FROM bets WHERE id = ?");
        Ok(sqlx::query_as::<_, Bet>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    /// A user's bets, newest first.
    pub async fn bets_for_user(&self, user_id: i64) -> Result<Vec<Bet>, MarketError> {
        let sql = format!("SELECT {BET_COLUMNS} FROM bets WHERE user_id = ? ORDER BY id DESC");
        Ok(sqlx::query_as::<_, Bet>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn bets_for_candidate(&self, candidate_id: i64) -> Result<Vec<Bet>, MarketError> {
        let sql = format!("SELECT {BET_COLUMNS} FROM bets WHERE candidate_id = ? ORDER BY id");
        Ok(sqlx::query_as::<_, Bet>(&sql)
            .bind(candidate_id)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<UserProfile, MarketError> {
        let user = self
            .user(user_id)
            .await?
            .ok_or_else(|| MarketError::not_found("user", user_id))?;
        let bets = self.bets_for_user(user_id).await?;
        let coins_at_risk = bets.iter().map(Bet::at_risk).sum();
        Ok(UserProfile {
            user,
            bets,
            coins_at_risk,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
