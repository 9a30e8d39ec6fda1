//! Candidate photo storage.
//!
//! Defines the `PhotoStore` trait and a directory-backed implementation.
//! The returned reference is the stored file name, which is what the
//! candidate record keeps and what `/uploads/<reference>` serves.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::MarketError;

/// Extensions accepted for candidate photos (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Abstraction over where uploaded photos end up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist `bytes` uploaded as `original_name` and return its reference.
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, MarketError>;
}

/// Lowercased extension of `filename` if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Strip a client-supplied file name down to something safe to write.
///
/// Path components are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and leading dots are removed.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Writes photos into a directory on local disk.
#[derive(Debug, Clone)]
pub struct DiskPhotoStore {
    root: PathBuf,
}

impl DiskPhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PhotoStore for DiskPhotoStore {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, MarketError> {
        if allowed_extension(original_name).is_none() {
            return Err(MarketError::InvalidInput(format!(
                "unsupported photo type: {original_name} (allowed: {})",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        let safe = sanitize_filename(original_name);
        let reference = format!("{}_{safe}", Utc::now().format("%Y%m%d%H%M%S"));

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&reference), bytes).await?;

        info!(reference = %reference, size = bytes.len(), "Photo stored");
        Ok(reference)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
