//! Settlement engine.
//!
//! Laying off a candidate resolves every open bet on them as won and
//! credits `floor(amount × odds_at_bet)` to each bettor. The flag change,
//! the resolutions and the credits commit together or not at all.
//!
//! Re-laying-off a candidate that is already laid off touches no bets.
//! Reverting a layoff only clears the flag: payouts stay paid and resolved
//! bets stay resolved.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::auth::AdminContext;
use crate::storage::accounts::{credit_user, fetch_user, resolve_open_bets};
use crate::storage::catalog::{fetch_candidate, set_candidate_laid_off};
use crate::storage::Store;
use crate::types::{payout_for, MarketError};

/// One bet paid out by a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub bet_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub payout: i64,
}

/// What a call to [`SettlementEngine::set_laid_off`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub was_laid_off: bool,
    pub laid_off: bool,
    pub payouts: Vec<Payout>,
    pub total_paid: i64,
}

impl SettlementReport {
    pub fn bets_resolved(&self) -> usize {
        self.payouts.len()
    }
}

#[derive(Debug, Clone)]
pub struct SettlementEngine {
    store: Store,
}

impl SettlementEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Set a candidate's laid-off flag, settling open bets on the first
    /// transition to `true`.
    pub async fn set_laid_off(
        &self,
        admin: &AdminContext,
        candidate_id: i64,
        laid_off: bool,
    ) -> Result<SettlementReport, MarketError> {
        let mut tx = self.store.begin().await?;

        let candidate = fetch_candidate(&mut tx, candidate_id)
            .await?
            .ok_or_else(|| MarketError::not_found("candidate", candidate_id))?;
        let was_laid_off = candidate.is_laid_off;

        set_candidate_laid_off(&mut tx, candidate_id, laid_off).await?;

        let mut payouts = Vec::new();
        if laid_off && !was_laid_off {
            for row in resolve_open_bets(&mut tx, candidate_id).await? {
                // Any early return drops the transaction, which rolls back
                // every resolution made so far.
                let payout = payout_for(row.amount, row.odds_at_bet).inspect_err(|_| {
                    error!(candidate_id, bet_id = row.bet_id, "Payout overflows; aborting settlement");
                })?;
                if credit_user(&mut tx, row.user_id, payout).await?.is_none() {
                    if fetch_user(&mut tx, row.user_id).await?.is_some() {
                        error!(
                            candidate_id,
                            bet_id = row.bet_id,
                            user_id = row.user_id,
                            payout,
                            "Credit would overflow the balance; aborting settlement"
                        );
                        return Err(MarketError::PayoutOverflow);
                    }
                    error!(
                        candidate_id,
                        bet_id = row.bet_id,
                        user_id = row.user_id,
                        "Bet owner missing during settlement; aborting"
                    );
                    return Err(MarketError::Storage(sqlx::Error::RowNotFound));
                }
                payouts.push(Payout {
                    bet_id: row.bet_id,
                    user_id: row.user_id,
                    amount: row.amount,
                    payout,
                });
            }
        } else if laid_off {
            debug!(candidate_id, "Candidate already laid off; no bets to settle");
        }

        tx.commit().await?;

        let total_paid = payouts.iter().map(|p| p.payout).sum();
        let report = SettlementReport {
            candidate_id,
            candidate_name: candidate.name,
            was_laid_off,
            laid_off,
            payouts,
            total_paid,
        };

        if laid_off {
            info!(
                admin = %admin,
                candidate_id,
                candidate = %report.candidate_name,
                bets = report.bets_resolved(),
                paid = total_paid,
                "Candidate LAID OFF, bets resolved"
            );
        } else if was_laid_off {
            warn!(
                admin = %admin,
                candidate_id,
                candidate = %report.candidate_name,
                "Layoff reverted; prior payouts stand"
            );
        } else {
            debug!(candidate_id, "Candidate status unchanged");
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
