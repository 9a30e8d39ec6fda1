//! Shared fixtures for integration testing.
//!
//! Provides a deterministic in-memory `PhotoStore` and a helper that
//! builds a seeded market with a few candidates, all with no external
//! dependencies.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

use layoffs_market::seed::seed_catalog;
use layoffs_market::storage::Store;
use layoffs_market::types::{Candidate, MarketError, NewCandidate};
use layoffs_market::uploads::PhotoStore;

/// A photo store that keeps uploads in memory.
#[derive(Default, Clone)]
pub struct MemoryPhotoStore {
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    /// If set, every store call fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, MarketError> {
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(MarketError::Upload(std::io::Error::other(msg)));
        }
        let reference = format!("mem_{original_name}");
        self.saved
            .lock()
            .unwrap()
            .push((reference.clone(), bytes.to_vec()));
        Ok(reference)
    }
}

/// Seeded catalog plus one candidate per odds value, all in the first
/// "C# Developer" position.
pub async fn seeded_market(odds: &[Decimal]) -> (Store, Vec<Candidate>) {
    let store = Store::in_memory().await.unwrap();
    seed_catalog(&store).await.unwrap();

    let position = store
        .positions()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.title == "C# Developer")
        .unwrap();

    let mut candidates = Vec::new();
    for (i, odds) in odds.iter().enumerate() {
        let candidate = store
            .create_candidate(&NewCandidate {
                position_id: position.id,
                name: format!("Candidate {}", i + 1),
                bio: None,
                odds: *odds,
                photo: None,
            })
            .await
            .unwrap();
        candidates.push(candidate);
    }
    (store, candidates)
}
