use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use shopreel_core::TenantId;
use shopreel_generation::GeneratedMedia;

use super::{check_segment, AssetStore, AssetStoreError, StoredAsset};

/// Stores assets as files under `<root>/<tenant>/<logical_id>.<ext>`.
///
/// URLs are `<base_url>/<tenant>/<file>`; serving them is left to whatever
/// fronts `root` (CDN, static file server).
#[derive(Debug, Clone)]
pub struct FilesystemAssetStore {
    root: PathBuf,
    base_url: String,
}

impl FilesystemAssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL this store produced back to its file path.
    fn path_for_url(&self, url: &str) -> Result<PathBuf, AssetStoreError> {
        let invalid = || AssetStoreError::InvalidUrl(url.to_string());
        let rest = url
            .strip_prefix(&self.base_url)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (tenant, file) = rest.split_once('/').ok_or_else(invalid)?;
        check_segment(tenant).map_err(|_| invalid())?;
        check_segment(file).map_err(|_| invalid())?;
        Ok(self.root.join(tenant).join(file))
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn save(
        &self,
        media: &GeneratedMedia,
        tenant_id: TenantId,
        logical_id: &str,
    ) -> Result<StoredAsset, AssetStoreError> {
        check_segment(logical_id)?;
        let tenant = tenant_id.to_string();
        let file_name = format!("{logical_id}.{}", media.extension());
        let dir = self.root.join(&tenant);
        tokio::fs::create_dir_all(&dir).await?;

        // Write-then-rename so readers never see a partial file.
        let target = dir.join(&file_name);
        let staging = dir.join(format!(".{file_name}.partial"));
        tokio::fs::write(&staging, &media.bytes).await?;
        tokio::fs::rename(&staging, &target).await?;

        debug!(path = %target.display(), bytes = media.bytes.len(), "asset saved");
        Ok(StoredAsset {
            url: format!("{}/{tenant}/{file_name}", self.base_url),
            size_bytes: media.bytes.len() as u64,
        })
    }

    async fn delete(&self, url: &str) -> Result<(), AssetStoreError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AssetStoreError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use shopreel_generation::MediaKind;

    use super::*;

    fn photo() -> GeneratedMedia {
        GeneratedMedia::new(MediaKind::Image, "image/png", b"\x89PNG-bytes".to_vec())
    }

    #[tokio::test]
    async fn saves_under_tenant_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path(), "https://cdn.example.com/assets/");
        let tenant = TenantId::new();

        let saved = store.save(&photo(), tenant, "job-7").await.unwrap();

        assert_eq!(
            saved.url,
            format!("https://cdn.example.com/assets/{tenant}/job-7.png")
        );
        let on_disk = std::fs::read(dir.path().join(tenant.to_string()).join("job-7.png")).unwrap();
        assert_eq!(on_disk, photo().bytes);
        assert_eq!(saved.size_bytes, on_disk.len() as u64);
    }

    #[tokio::test]
    async fn repeated_save_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path(), "file:///assets");
        let tenant = TenantId::new();

        let a = store.save(&photo(), tenant, "job-8").await.unwrap();
        let b = store.save(&photo(), tenant, "job-8").await.unwrap();

        assert_eq!(a.url, b.url);
        let entries = std::fs::read_dir(dir.path().join(tenant.to_string()))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn delete_round_trip_and_rejects_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path(), "https://cdn.example.com");
        let saved = store.save(&photo(), TenantId::new(), "job-9").await.unwrap();

        store.delete(&saved.url).await.unwrap();
        assert!(matches!(
            store.delete(&saved.url).await,
            Err(AssetStoreError::NotFound(_))
        ));

        for url in [
            "https://other.example.com/t/job-9.png",
            "https://cdn.example.com/../secrets.txt",
            "https://cdn.example.com/t/../../etc/passwd",
            "https://cdn.example.com/no-file",
        ] {
            assert!(
                matches!(store.delete(url).await, Err(AssetStoreError::InvalidUrl(_))),
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn traversal_in_logical_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path(), "https://cdn.example.com");

        let err = store.save(&photo(), TenantId::new(), "../escape").await;
        assert!(matches!(err, Err(AssetStoreError::InvalidUrl(_))));
    }
}
