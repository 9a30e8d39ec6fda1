//! Catalog tooling: first-run seeding, candidate import from evaluation
//! scores, and applying post-layoff headcounts as planned cuts.

pub mod catalog;
pub mod cuts;
pub mod import;

pub use cuts::{apply_remaining_headcount, CutLine, CutsReport, RemainingHeadcount};
pub use import::{calculate_odds, import_candidates, CandidateImport, ImportReport};

use serde::Serialize;
use tracing::{debug, info};

use crate::storage::Store;
use crate::types::{MarketError, NewDepartment, NewPosition};
use catalog::{SeedDepartment, CATALOG};

/// What a call to [`seed_catalog`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub departments: usize,
    pub positions: usize,
    pub employees: i64,
}

/// Department code derived from its name: first three characters, uppercased.
pub fn department_code(name: &str) -> String {
    name.chars().take(3).collect::<String>().to_uppercase()
}

fn to_rows(catalog: &[SeedDepartment]) -> Vec<(NewDepartment, Vec<NewPosition>)> {
    catalog
        .iter()
        .map(|dept| {
            let positions = dept
                .positions
                .iter()
                .map(|p| NewPosition {
                    department_id: 0,
                    title: p.title.to_string(),
                    cor_code: Some(p.cor_code.to_string()),
                    total_employees: p.total,
                    positions_to_cut: 0,
                })
                .collect();
            (
                NewDepartment {
                    name: dept.name.to_string(),
                    code: Some(department_code(dept.name)),
                },
                positions,
            )
        })
        .collect()
}

/// Load the built-in catalog into an empty store. Does nothing when any
/// department already exists.
pub async fn seed_catalog(store: &Store) -> Result<SeedReport, MarketError> {
    let existing = store.departments().await?.len();
    if existing > 0 {
        debug!(existing, "Catalog already present; skipping seed");
        return Ok(SeedReport::default());
    }

    let rows = to_rows(CATALOG);
    let employees = rows
        .iter()
        .flat_map(|(_, positions)| positions.iter().map(|p| p.total_employees))
        .sum();
    let (departments, positions) = store.insert_catalog(&rows).await?;

    info!(departments, positions, employees, "Catalog seeded");
    Ok(SeedReport {
        departments,
        positions,
        employees,
    })
}
