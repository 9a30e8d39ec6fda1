//! Candidate import from evaluation scores.
//!
//! Lower scores make a layoff more likely, so they get shorter odds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::Store;
use crate::types::{CandidateUpdate, MarketError, NewCandidate, Position};

/// One team member to import.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateImport {
    pub name: String,
    /// Evaluation scores on a 0..=10 scale. Averaged.
    #[serde(default)]
    pub scores: Vec<Decimal>,
}

impl CandidateImport {
    pub fn average_score(&self) -> Option<Decimal> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: Decimal = self.scores.iter().sum();
        Some(sum / Decimal::from(self.scores.len()))
    }

    fn bio(&self) -> String {
        match self.average_score() {
            Some(avg) => format!("Team member. Evaluation: score={avg:.1}"),
            None => "Team member. Evaluation: no evaluation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub position_id: i64,
    pub added: usize,
    pub updated: usize,
}

/// Map an evaluation score to odds: 0 → 1.5, 10 → 5.0, none → 3.0.
pub fn calculate_odds(score: Option<Decimal>) -> Decimal {
    match score {
        None => dec!(3.0),
        Some(score) => (dec!(1.5) + score / dec!(10) * dec!(3.5)).round_dp(2),
    }
}

async fn target_position(store: &Store, position_id: Option<i64>) -> Result<Position, MarketError> {
    if let Some(id) = position_id {
        return store
            .position(id)
            .await?
            .ok_or_else(|| MarketError::not_found("position", id));
    }
    let positions = store.positions().await?;
    positions
        .iter()
        .find(|p| p.title.contains("Developer"))
        .or_else(|| positions.first())
        .cloned()
        .ok_or_else(|| MarketError::not_found("position", 0))
}

/// Insert or refresh candidates by name. New candidates land in
/// `position_id`, or the first developer position when none is given.
pub async fn import_candidates(
    store: &Store,
    members: &[CandidateImport],
    position_id: Option<i64>,
) -> Result<ImportReport, MarketError> {
    let position = target_position(store, position_id).await?;
    info!(position_id = position.id, title = %position.title, "Importing candidates");

    let mut report = ImportReport {
        position_id: position.id,
        ..Default::default()
    };

    for member in members {
        let name = member.name.trim();
        if name.is_empty() {
            warn!("Skipping import row with empty name");
            continue;
        }
        let odds = calculate_odds(member.average_score());
        let bio = member.bio();

        match store.candidate_by_name(name).await? {
            Some(existing) => {
                store
                    .update_candidate(
                        existing.id,
                        &CandidateUpdate {
                            odds: Some(odds),
                            bio: Some(bio),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(name, from = %existing.odds, to = %odds, "Candidate odds refreshed");
                report.updated += 1;
            }
            None => {
                store
                    .create_candidate(&NewCandidate {
                        position_id: position.id,
                        name: name.to_string(),
                        bio: Some(bio),
                        odds,
                        photo: None,
                    })
                    .await?;
                report.added += 1;
            }
        }
    }

    info!(added = report.added, updated = report.updated, "Import finished");
    Ok(report)
}
