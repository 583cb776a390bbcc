use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use shopreel_core::TenantId;
use shopreel_generation::GeneratedMedia;

use super::{check_segment, AssetStore, AssetStoreError, StoredAsset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// In-memory asset store handing out `memory://` URLs.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<StoredBlob> {
        self.blobs.read().unwrap().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn save(
        &self,
        media: &GeneratedMedia,
        tenant_id: TenantId,
        logical_id: &str,
    ) -> Result<StoredAsset, AssetStoreError> {
        check_segment(logical_id)?;
        let url = format!("memory://{tenant_id}/{logical_id}.{}", media.extension());

        self.blobs.write().unwrap().insert(
            url.clone(),
            StoredBlob {
                mime_type: media.mime_type.clone(),
                bytes: media.bytes.clone(),
            },
        );

        Ok(StoredAsset {
            url,
            size_bytes: media.bytes.len() as u64,
        })
    }

    async fn delete(&self, url: &str) -> Result<(), AssetStoreError> {
        if !url.starts_with("memory://") {
            return Err(AssetStoreError::InvalidUrl(url.to_string()));
        }
        self.blobs
            .write()
            .unwrap()
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| AssetStoreError::NotFound(url.to_string()))
    }
}
