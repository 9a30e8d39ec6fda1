//! Shared types for the layoffs market.
//!
//! These types form the data model used across all modules. The store,
//! the wager/settlement engine and the web layer all speak in these
//! records, so they carry no persistence or transport logic of their own.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coins granted to every freshly registered user.
pub const STARTING_COINS: i64 = 1000;

/// Image reference used when a candidate has no uploaded photo.
pub const DEFAULT_PHOTO: &str = "default.png";

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 80;

/// Highest odds an admin may set on a candidate.
pub const MAX_ODDS: Decimal = Decimal::ONE_THOUSAND;

/// Payout for a winning stake: `floor(amount × odds)`.
///
/// Computed in decimal arithmetic so `100 × 2.05` pays exactly 205. A
/// product that does not fit a coin balance is a `PayoutOverflow`.
pub fn payout_for(amount: i64, odds: Decimal) -> Result<i64, MarketError> {
    Decimal::from(amount)
        .checked_mul(odds)
        .and_then(|total| total.floor().to_i64())
        .ok_or(MarketError::PayoutOverflow)
}

// ---------------------------------------------------------------------------
// Catalog: departments, positions, candidates
// ---------------------------------------------------------------------------

/// A department of the company. Owns its positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// A job title inside a department, with its headcount and planned cuts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: i64,
    pub title: String,
    pub cor_code: Option<String>,
    pub total_employees: i64,
    pub positions_to_cut: i64,
    pub department_id: i64,
}

impl Position {
    /// Seats that survive the planned cuts.
    pub fn remaining(&self) -> i64 {
        (self.total_employees - self.positions_to_cut).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPosition {
    pub department_id: i64,
    pub title: String,
    #[serde(default)]
    pub cor_code: Option<String>,
    #[serde(default)]
    pub total_employees: i64,
    #[serde(default)]
    pub positions_to_cut: i64,
}

impl NewPosition {
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.title.trim().is_empty() {
            return Err(MarketError::InvalidInput("position title is required".into()));
        }
        if self.total_employees < 0 || self.positions_to_cut < 0 {
            return Err(MarketError::InvalidInput(
                "headcounts cannot be negative".into(),
            ));
        }
        if self.positions_to_cut > self.total_employees {
            return Err(MarketError::InvalidInput(format!(
                "cannot cut {} of {} seats",
                self.positions_to_cut, self.total_employees
            )));
        }
        Ok(())
    }
}

/// An employee users can bet on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub photo: String,
    /// Live payout multiplier. Bets copy it at placement time.
    pub odds: Decimal,
    pub bio: Option<String>,
    pub is_laid_off: bool,
    pub position_id: i64,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (odds {}x{})",
            self.name,
            self.odds,
            if self.is_laid_off { ", LAID OFF" } else { "" }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCandidate {
    pub position_id: i64,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    pub odds: Decimal,
    #[serde(default)]
    pub photo: Option<String>,
}

impl NewCandidate {
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.name.trim().is_empty() {
            return Err(MarketError::InvalidInput("candidate name is required".into()));
        }
        validate_odds(self.odds)
    }
}

/// Partial edit of a candidate. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub odds: Option<Decimal>,
    pub position_id: Option<i64>,
    pub photo: Option<String>,
}

impl CandidateUpdate {
    pub fn validate(&self) -> Result<(), MarketError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(MarketError::InvalidInput("candidate name is required".into()));
            }
        }
        match self.odds {
            Some(odds) => validate_odds(odds),
            None => Ok(()),
        }
    }
}

fn validate_odds(odds: Decimal) -> Result<(), MarketError> {
    if odds <= Decimal::ZERO {
        return Err(MarketError::InvalidInput(format!(
            "odds must be positive, got {odds}"
        )));
    }
    if odds > MAX_ODDS {
        return Err(MarketError::InvalidInput(format!(
            "odds must be at most {MAX_ODDS}, got {odds}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Accounts: users and bets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub coins: i64,
    pub created_at: DateTime<Utc>,
}

/// A wager on a candidate being laid off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: i64,
    pub user_id: i64,
    pub candidate_id: i64,
    pub amount: i64,
    /// Candidate odds frozen at placement. Never updated.
    pub odds_at_bet: Decimal,
    pub is_resolved: bool,
    pub won: bool,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// What this bet pays if its candidate is laid off.
    pub fn potential_payout(&self) -> Result<i64, MarketError> {
        payout_for(self.amount, self.odds_at_bet)
    }

    /// Stake still riding on an unresolved outcome.
    pub fn at_risk(&self) -> i64 {
        if self.is_resolved {
            0
        } else {
            self.amount
        }
    }
}

/// Result of a successful bet placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetReceipt {
    pub bet_id: i64,
    pub candidate_name: String,
    pub new_balance: i64,
    pub odds_at_bet: Decimal,
    /// Display only. Not persisted.
    pub potential_payout: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub coins: i64,
}

/// A user with their bets and the stake still riding on open bets.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub bets: Vec<Bet>,
    pub coins_at_risk: i64,
}

/// Headline figures shown on the landing page and the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub departments: i64,
    pub positions: i64,
    pub candidates: i64,
    pub users: i64,
    pub bets: i64,
    pub total_employees: i64,
    pub total_to_cut: i64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors surfaced by the store and the engine.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Too late! They are already gone")]
    MarketClosed,

    #[error("Bet amount must be positive")]
    InvalidAmount,

    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Username taken")]
    UsernameTaken,

    #[error("Payout does not fit in a coin balance")]
    PayoutOverflow,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Admin authorization required")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Upload error: {0}")]
    Upload(#[from] std::io::Error),
}

impl MarketError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        MarketError::NotFound { entity, id }
    }

    /// Whether the failure is internal rather than caused by the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, MarketError::Storage(_) | MarketError::Upload(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
