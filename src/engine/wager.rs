//! Wager service: registration and bet placement.
//!
//! A bet debits the stake and freezes the candidate's current odds into
//! the bet record. Both happen in one transaction, and both statements
//! carry their own guard so a concurrent request can't overdraw a balance
//! or slip a bet in after a layoff.

use tracing::{debug, info};

use crate::storage::accounts::{debit_user, fetch_user, insert_open_bet};
use crate::storage::catalog::fetch_candidate;
use crate::storage::Store;
use crate::types::{payout_for, BetReceipt, MarketError, User};

#[derive(Debug, Clone)]
pub struct WagerService {
    store: Store,
}

impl WagerService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Register a new player with the starting balance.
    pub async fn register_user(&self, username: &str) -> Result<User, MarketError> {
        self.store.create_user(username).await
    }

    /// Place a bet of `amount` coins on `candidate_id` being laid off.
    ///
    /// Checks run in order and the first failure wins: both records exist,
    /// the candidate is still active, the amount is positive, the user can
    /// cover it.
    pub async fn place_bet(
        &self,
        user_id: i64,
        candidate_id: i64,
        amount: i64,
    ) -> Result<BetReceipt, MarketError> {
        let mut tx = self.store.begin().await?;

        let user = fetch_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| MarketError::not_found("user", user_id))?;
        let candidate = fetch_candidate(&mut tx, candidate_id)
            .await?
            .ok_or_else(|| MarketError::not_found("candidate", candidate_id))?;

        if candidate.is_laid_off {
            debug!(candidate_id, "Bet refused: candidate already laid off");
            return Err(MarketError::MarketClosed);
        }
        if amount <= 0 {
            return Err(MarketError::InvalidAmount);
        }
        if amount > user.coins {
            return Err(MarketError::InsufficientFunds {
                needed: amount,
                available: user.coins,
            });
        }

        let new_balance = match debit_user(&mut tx, user_id, amount).await? {
            Some(balance) => balance,
            None => {
                // Balance moved under us; report what is there now.
                let available = fetch_user(&mut tx, user_id)
                    .await?
                    .map(|u| u.coins)
                    .unwrap_or(0);
                return Err(MarketError::InsufficientFunds {
                    needed: amount,
                    available,
                });
            }
        };

        let bet = insert_open_bet(&mut tx, user_id, candidate_id, amount)
            .await?
            .ok_or(MarketError::MarketClosed)?;

        // A bet that could never be paid out is not placed.
        let potential_payout = payout_for(bet.amount, bet.odds_at_bet)?;

        tx.commit().await?;

        let receipt = BetReceipt {
            bet_id: bet.id,
            candidate_name: candidate.name,
            new_balance,
            odds_at_bet: bet.odds_at_bet,
            potential_payout,
        };

        info!(
            bet_id = receipt.bet_id,
            user_id,
            candidate_id,
            amount,
            odds = %receipt.odds_at_bet,
            balance = new_balance,
            "Bet placed"
        );

        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
