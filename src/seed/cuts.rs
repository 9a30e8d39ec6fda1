//! Planned cuts from post-layoff headcounts.
//!
//! Given how many people remain in each position after the layoff, set
//! `positions_to_cut = total_employees - remaining`. Positions absent from
//! the input are treated as fully cut.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::storage::Store;
use crate::types::MarketError;

/// Department name → position title → headcount after the layoff.
pub type RemainingHeadcount = BTreeMap<String, BTreeMap<String, i64>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutLine {
    pub department: String,
    pub title: String,
    pub before: i64,
    pub after: i64,
    pub cuts: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CutsReport {
    pub lines: Vec<CutLine>,
    pub total_before: i64,
    pub total_after: i64,
    pub total_cuts: i64,
}

/// Cuts for one position, clamped into `0..=before`.
fn cuts_for(before: i64, after: i64) -> i64 {
    (before - after).clamp(0, before.max(0))
}

pub async fn apply_remaining_headcount(
    store: &Store,
    remaining: &RemainingHeadcount,
) -> Result<CutsReport, MarketError> {
    let mut report = CutsReport::default();
    let empty = BTreeMap::new();

    for dept in store.departments().await? {
        let after_by_title = remaining.get(&dept.name).unwrap_or(&empty);

        for position in store.positions_in_department(dept.id).await? {
            let before = position.total_employees;
            let after = after_by_title.get(&position.title).copied().unwrap_or(0);
            let cuts = cuts_for(before, after);
            if cuts != before - after {
                warn!(
                    department = %dept.name,
                    title = %position.title,
                    before,
                    after,
                    clamped = cuts,
                    "Remaining headcount out of range"
                );
            }

            store.set_positions_to_cut(position.id, cuts).await?;

            report.total_before += before;
            report.total_after += after;
            report.total_cuts += cuts;
            report.lines.push(CutLine {
                department: dept.name.clone(),
                title: position.title,
                before,
                after,
                cuts,
            });
        }
    }

    info!(
        before = report.total_before,
        after = report.total_after,
        cuts = report.total_cuts,
        "Planned cuts updated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_catalog;
    use crate::types::{NewDepartment, NewPosition};

    #[test]
    fn test_cuts_for() {
        assert_eq!(cuts_for(17, 7), 10);
        assert_eq!(cuts_for(3, 0), 3);
        assert_eq!(cuts_for(2, 5), 0);
        assert_eq!(cuts_for(2, -1), 2);
    }

    #[tokio::test]
    async fn test_apply_with_missing_and_excess_entries() {
        let store = Store::in_memory().await.unwrap();
        let dept = store
            .create_department(&NewDepartment { name: "Cross HR".into(), code: None })
            .await
            .unwrap();
        for (title, total) in [("HR Director", 1), ("Talent Acquisition Specialist", 2), ("Recruiter", 3)] {
            store
                .create_position(&NewPosition {
                    department_id: dept.id,
                    title: title.into(),
                    cor_code: None,
                    total_employees: total,
                    positions_to_cut: 0,
                })
                .await
                .unwrap();
        }

        let mut hr = BTreeMap::new();
        hr.insert("HR Director".to_string(), 1);
        hr.insert("Talent Acquisition Specialist".to_string(), 9);
        let mut remaining = RemainingHeadcount::new();
        remaining.insert("Cross HR".to_string(), hr);

        let report = apply_remaining_headcount(&store, &remaining).await.unwrap();
        let cuts: Vec<i64> = report.lines.iter().map(|l| l.cuts).collect();
        assert_eq!(cuts, vec![0, 0, 3]);
        assert_eq!(report.total_before, 6);
        assert_eq!(report.total_cuts, 3);

        let positions = store.positions_in_department(dept.id).await.unwrap();
        assert_eq!(positions[2].positions_to_cut, 3);
        assert_eq!(positions[2].remaining(), 0);
    }

    #[tokio::test]
    async fn test_bundled_headcount_file_matches_catalog() {
        let store = Store::in_memory().await.unwrap();
        seed_catalog(&store).await.unwrap();

        let remaining: RemainingHeadcount =
            serde_json::from_str(include_str!("../../data/remaining_headcount.json")).unwrap();
        let report = apply_remaining_headcount(&store, &remaining).await.unwrap();

        assert_eq!(report.lines.len(), 91);
        assert_eq!(report.total_before, 262);
        assert_eq!(report.total_after, 199);
        assert_eq!(report.total_cuts, 63);
        assert_eq!(store.catalog_summary().await.unwrap().total_to_cut, 63);
    }
}
