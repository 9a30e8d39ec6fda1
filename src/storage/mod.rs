//! Persistence layer.
//!
//! A SQLite database accessed through `sqlx`. The schema lives in
//! `migrations/` and is embedded into the binary. Every read goes to the
//! database; nothing is cached in process.
//!
//! Pool-level methods on [`Store`] cover the plain CRUD surface. The engine
//! runs its multi-statement units of work on a transaction from
//! [`Store::begin`] and uses the connection-level helpers in
//! [`accounts`] and [`catalog`] so every statement lands in the same
//! transaction.

pub mod accounts;
pub mod catalog;

use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{FromRow, Row, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{Bet, Candidate, MarketError};

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the backing store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `url` and apply migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, MarketError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, max_connections, "Database ready");
        Ok(store)
    }

    /// A private in-memory database, used by tests and dry runs.
    ///
    /// An in-memory SQLite database lives and dies with its connection, so
    /// the pool holds exactly one that never expires.
    pub async fn in_memory() -> Result<Self, MarketError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        debug!("In-memory database ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), MarketError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MarketError::Storage(e.into()))
    }

    /// Start a write transaction. Dropping it without commit rolls back.
    ///
    /// The write lock is taken up front with `BEGIN IMMEDIATE`, so a second
    /// writer waits out [`BUSY_TIMEOUT`] at the start instead of failing when
    /// its read snapshot goes stale.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, MarketError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

pub(crate) const CANDIDATE_COLUMNS: &str =
    "id, name, photo, odds, bio, is_laid_off, position_id";

pub(crate) const BET_COLUMNS: &str =
    "id, user_id, candidate_id, amount, odds_at_bet, is_resolved, won, created_at";

/// Odds are stored as text so the decimal survives unchanged.
pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, SqliteRow> for Candidate {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let odds: String = row.try_get("odds")?;
        Ok(Candidate {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            photo: row.try_get("photo")?,
            odds: decode_decimal("odds", &odds)?,
            bio: row.try_get("bio")?,
            is_laid_off: row.try_get("is_laid_off")?,
            position_id: row.try_get("position_id")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for Bet {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let odds: String = row.try_get("odds_at_bet")?;
        Ok(Bet {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            candidate_id: row.try_get("candidate_id")?,
            amount: row.try_get("amount")?,
            odds_at_bet: decode_decimal("odds_at_bet", &odds)?,
            is_resolved: row.try_get("is_resolved")?,
            won: row.try_get("won")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
