//! Asset store boundary: durable storage for generated media.
//!
//! Stores are keyed by `(tenant, logical_id)`. Saving the same logical id
//! twice overwrites the same object and returns the same URL, so a retried
//! upload never leaves duplicates behind.

pub mod filesystem;
pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopreel_core::TenantId;
use shopreel_generation::GeneratedMedia;

pub use filesystem::FilesystemAssetStore;
pub use in_memory::InMemoryAssetStore;

/// Where a saved asset can be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub url: String,
    pub size_bytes: u64,
}

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("asset io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid asset url or id: {0}")]
    InvalidUrl(String),
    #[error("asset not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait AssetStore: Send + Sync + 'static {
    /// Persist `media` for `tenant_id` under `logical_id` and return its URL.
    async fn save(
        &self,
        media: &GeneratedMedia,
        tenant_id: TenantId,
        logical_id: &str,
    ) -> Result<StoredAsset, AssetStoreError>;

    /// Remove a previously saved asset by its URL.
    async fn delete(&self, url: &str) -> Result<(), AssetStoreError>;
}

#[async_trait]
impl<S> AssetStore for Arc<S>
where
    S: AssetStore + ?Sized,
{
    async fn save(
        &self,
        media: &GeneratedMedia,
        tenant_id: TenantId,
        logical_id: &str,
    ) -> Result<StoredAsset, AssetStoreError> {
        (**self).save(media, tenant_id, logical_id).await
    }

    async fn delete(&self, url: &str) -> Result<(), AssetStoreError> {
        (**self).delete(url).await
    }
}

/// Reject ids that could escape the tenant's namespace.
pub(crate) fn check_segment(segment: &str) -> Result<(), AssetStoreError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment.contains("..")
        || segment.contains(['/', '\\', '\0']);
    if bad {
        return Err(AssetStoreError::InvalidUrl(segment.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_cannot_traverse() {
        assert!(check_segment("0192f6c4-job").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(check_segment(bad).is_err(), "{bad:?}");
        }
    }
}
