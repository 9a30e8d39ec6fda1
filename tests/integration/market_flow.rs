//! Full pool lifecycle through the library API.

use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use layoffs_market::auth::AdminContext;
use layoffs_market::engine::{SettlementEngine, WagerService};
use layoffs_market::seed::{self, CandidateImport, RemainingHeadcount};
use layoffs_market::types::MarketError;

use crate::support::seeded_market;

#[tokio::test]
async fn test_full_round_conserves_coins() {
    let (store, candidates) = seeded_market(&[dec!(2.0), dec!(2.05), dec!(5.0)]).await;
    let wagers = WagerService::new(store.clone());
    let engine = SettlementEngine::new(store.clone());
    let admin = AdminContext::local("ops");

    let alice = wagers.register_user("alice").await.unwrap();
    let bob = wagers.register_user("bob").await.unwrap();

    wagers.place_bet(alice.id, candidates[0].id, 300).await.unwrap();
    wagers.place_bet(alice.id, candidates[2].id, 100).await.unwrap();
    wagers.place_bet(bob.id, candidates[1].id, 100).await.unwrap();
    wagers.place_bet(bob.id, candidates[0].id, 1).await.unwrap();

    let first = engine.set_laid_off(&admin, candidates[0].id, true).await.unwrap();
    assert_eq!(first.total_paid, 600 + 2);
    let second = engine.set_laid_off(&admin, candidates[1].id, true).await.unwrap();
    assert_eq!(second.payouts[0].payout, 205);

    let alice_now = store.user_profile(alice.id).await.unwrap();
    assert_eq!(alice_now.user.coins, 1000 - 400 + 600);
    assert_eq!(alice_now.coins_at_risk, 100);

    let bob_now = store.user_profile(bob.id).await.unwrap();
    assert_eq!(bob_now.user.coins, 1000 - 101 + 205 + 2);
    assert_eq!(bob_now.coins_at_risk, 0);

    let board = store.leaderboard(10).await.unwrap();
    assert_eq!(board[0].username, "alice");
    assert_eq!(board[0].coins, 1200);
    assert_eq!(board[1].coins, 1106);

    // Betting on a settled candidate stays closed.
    assert!(matches!(
        wagers.place_bet(bob.id, candidates[0].id, 10).await,
        Err(MarketError::MarketClosed)
    ));
}

#[tokio::test]
async fn test_department_delete_cascades_to_bets() {
    let (store, candidates) = seeded_market(&[dec!(2.0)]).await;
    let wagers = WagerService::new(store.clone());
    let user = wagers.register_user("casualty").await.unwrap();
    let receipt = wagers.place_bet(user.id, candidates[0].id, 50).await.unwrap();

    let position = store.position(candidates[0].position_id).await.unwrap().unwrap();
    store.delete_department(position.department_id).await.unwrap();

    assert!(store.position(position.id).await.unwrap().is_none());
    assert!(store.candidate(candidates[0].id).await.unwrap().is_none());
    assert!(store.bet(receipt.bet_id).await.unwrap().is_none());
    // The stake is gone with the bet; the user remains.
    assert_eq!(store.user(user.id).await.unwrap().unwrap().coins, 950);
}

#[tokio::test]
async fn test_import_then_cuts_then_settle() {
    let (store, _) = seeded_market(&[]).await;

    let members = vec![
        CandidateImport { name: "Low".into(), scores: vec![dec!(0)] },
        CandidateImport { name: "High".into(), scores: vec![dec!(10), dec!(10)] },
    ];
    let report = seed::import_candidates(&store, &members, None).await.unwrap();
    assert_eq!(report.added, 2);
    let position = store.position(report.position_id).await.unwrap().unwrap();
    assert_eq!(position.title, "C# Developer");

    let mut cc = BTreeMap::new();
    cc.insert("C# Developer".to_string(), 7);
    let mut remaining = RemainingHeadcount::new();
    remaining.insert("CC (Caesars Slots)".to_string(), cc);
    let cuts = seed::apply_remaining_headcount(&store, &remaining).await.unwrap();
    let dev_line = cuts
        .lines
        .iter()
        .find(|l| l.department == "CC (Caesars Slots)" && l.title == "C# Developer")
        .unwrap();
    assert_eq!(dev_line.cuts, 10);
    assert_eq!(store.position(position.id).await.unwrap().unwrap().positions_to_cut, 10);

    let low = store.candidate_by_name("Low").await.unwrap().unwrap();
    let wagers = WagerService::new(store.clone());
    let user = wagers.register_user("insider").await.unwrap();
    wagers.place_bet(user.id, low.id, 100).await.unwrap();

    SettlementEngine::new(store.clone())
        .set_laid_off(&AdminContext::local("ops"), low.id, true)
        .await
        .unwrap();
    assert_eq!(store.user(user.id).await.unwrap().unwrap().coins, 900 + 150);
}

/// A file-backed store with a pooled set of connections, so spawned tasks
/// really do write concurrently.
async fn file_market(
    pool_size: u32,
) -> (std::path::PathBuf, layoffs_market::storage::Store, layoffs_market::types::Candidate) {
    let dir = std::env::temp_dir().join(format!("layoffs_it_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}", dir.join("market.db").display());
    let store = layoffs_market::storage::Store::connect(&url, pool_size).await.unwrap();
    seed::seed_catalog(&store).await.unwrap();
    let position = store.positions().await.unwrap()[0].clone();
    let candidate = store
        .create_candidate(&layoffs_market::types::NewCandidate {
            position_id: position.id,
            name: "Contested".into(),
            bio: None,
            odds: dec!(2.0),
            photo: None,
        })
        .await
        .unwrap();
    (dir, store, candidate)
}

#[tokio::test]
async fn test_concurrent_bets_never_overdraw() {
    let (dir, store, candidate) = file_market(4).await;
    let wagers = WagerService::new(store.clone());
    let user = wagers.register_user("racer").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let wagers = wagers.clone();
        let (user_id, candidate_id) = (user.id, candidate.id);
        handles.push(tokio::spawn(async move {
            wagers.place_bet(user_id, candidate_id, 300).await
        }));
    }

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(MarketError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let coins = store.user(user.id).await.unwrap().unwrap().coins;
    assert_eq!(placed, 3);
    assert_eq!(coins, 1000 - 300 * placed);
    assert_eq!(store.bets_for_user(user.id).await.unwrap().len() as i64, placed);

    store.pool().close().await;
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_affordable_bets_all_succeed() {
    let (dir, store, candidate) = file_market(8).await;
    let wagers = WagerService::new(store.clone());

    let mut users = Vec::new();
    for i in 0..16 {
        users.push(wagers.register_user(&format!("crowd{i}")).await.unwrap());
    }

    for _round in 0..5 {
        let mut handles = Vec::new();
        for user in &users {
            let wagers = wagers.clone();
            let (user_id, candidate_id) = (user.id, candidate.id);
            handles.push(tokio::spawn(async move {
                wagers.place_bet(user_id, candidate_id, 10).await
            }));
        }
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                panic!("affordable bet failed: {e:?}");
            }
        }
    }

    for user in &users {
        assert_eq!(store.user(user.id).await.unwrap().unwrap().coins, 950);
    }
    assert_eq!(store.bets_for_candidate(candidate.id).await.unwrap().len(), 80);

    store.pool().close().await;
    std::fs::remove_dir_all(&dir).unwrap();
}
