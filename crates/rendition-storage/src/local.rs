use crate::keys::validate_object_id;
use crate::traits::{AssetGateway, Namespace, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory holding public-read markers, one empty file per public object.
const PUBLIC_MARKER_DIR: &str = ".public";

/// Local filesystem gateway
///
/// Each namespace is a directory under `base_path`. Public visibility is tracked
/// with marker files so the upload and make-public steps stay separate, as they
/// are on a real object store.
#[derive(Clone)]
pub struct LocalGateway {
    base_path: PathBuf,
    base_url: String,
    raw_bucket: String,
    processed_bucket: String,
}

impl LocalGateway {
    /// Create a new LocalGateway instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding both namespaces (e.g., "/var/lib/rendition/objects")
    /// * `base_url` - Base URL of a static file server rooted at `base_path`
    ///   (e.g., "http://localhost:3000/media"). Nothing in this crate serves it.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        raw_bucket: String,
        processed_bucket: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        for dir in [
            base_path.join(&raw_bucket),
            base_path.join(&processed_bucket),
            base_path.join(PUBLIC_MARKER_DIR).join(&processed_bucket),
        ] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalGateway {
            base_path,
            base_url,
            raw_bucket,
            processed_bucket,
        })
    }

    /// Filesystem location of an object in the given namespace.
    pub fn object_path(&self, namespace: Namespace, id: &str) -> StorageResult<PathBuf> {
        validate_object_id(id)?;
        let bucket = match namespace {
            Namespace::Raw => &self.raw_bucket,
            Namespace::Processed => &self.processed_bucket,
        };
        Ok(self.base_path.join(bucket).join(id))
    }

    fn public_marker_path(&self, id: &str) -> StorageResult<PathBuf> {
        validate_object_id(id)?;
        Ok(self
            .base_path
            .join(PUBLIC_MARKER_DIR)
            .join(&self.processed_bucket)
            .join(id))
    }

    /// Whether a processed object has been made public.
    pub async fn is_public(&self, id: &str) -> StorageResult<bool> {
        let marker = self.public_marker_path(id)?;
        Ok(fs::try_exists(&marker).await.unwrap_or(false))
    }

    /// Whether an object exists in the given namespace.
    pub async fn exists(&self, namespace: Namespace, id: &str) -> StorageResult<bool> {
        let path = self.object_path(namespace, id)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// Generate public URL for file
    fn generate_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.processed_bucket,
            id
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssetGateway for LocalGateway {
    async fn fetch(&self, source_id: &str, destination: &Path) -> StorageResult<u64> {
        let path = self.object_path(Namespace::Raw, source_id)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!(
                "{}/{}",
                self.raw_bucket, source_id
            )));
        }

        let size = fs::copy(&path, destination).await.map_err(|e| {
            StorageError::TransferFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                destination.display(),
                e
            ))
        })?;

        tracing::info!(
            bucket = %self.raw_bucket,
            key = %source_id,
            destination = %destination.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage fetch successful"
        );

        Ok(size)
    }

    async fn upload(&self, local_path: &Path, destination_id: &str) -> StorageResult<()> {
        let path = self.object_path(Namespace::Processed, destination_id)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let size = fs::copy(local_path, &path).await.map_err(|e| {
            StorageError::TransferFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn make_public(&self, destination_id: &str) -> StorageResult<String> {
        let object = self.object_path(Namespace::Processed, destination_id)?;
        if !fs::try_exists(&object).await.unwrap_or(false) {
            return Err(StorageError::MakePublicFailed(format!(
                "{}/{} does not exist",
                self.processed_bucket, destination_id
            )));
        }

        let marker = self.public_marker_path(destination_id)?;
        self.ensure_parent_dir(&marker).await?;
        fs::write(&marker, b"").await.map_err(|e| {
            StorageError::MakePublicFailed(format!(
                "Failed to write public marker {}: {}",
                marker.display(),
                e
            ))
        })?;

        let url = self.generate_url(destination_id);
        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            url = %url,
            "Local storage object made public"
        );

        Ok(url)
    }

    async fn remove(&self, destination_id: &str) -> StorageResult<()> {
        let path = self.object_path(Namespace::Processed, destination_id)?;
        let marker = self.public_marker_path(destination_id)?;

        for target in [&path, &marker] {
            if !fs::try_exists(target).await.unwrap_or(false) {
                continue;
            }
            fs::remove_file(target).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete {}: {}",
                    target.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn gateway(dir: &Path) -> LocalGateway {
        LocalGateway::new(
            dir,
            "http://localhost:3000/media".to_string(),
            "raw-videos".to_string(),
            "processed-videos".to_string(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_copies_raw_object() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let raw = gateway.object_path(Namespace::Raw, "clip1.mp4").unwrap();
        fs::write(&raw, b"raw bytes").await.unwrap();

        let destination = dir.path().join("staged.mp4");
        let size = gateway.fetch("clip1.mp4", &destination).await.unwrap();

        assert_eq!(size, 9);
        assert_eq!(fs::read(&destination).await.unwrap(), b"raw bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let destination = dir.path().join("staged.mp4");
        let result = gateway.fetch("missing.mp4", &destination).await;

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_upload_is_private_until_made_public() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let local = dir.path().join("out.mp4");
        fs::write(&local, b"rendition").await.unwrap();

        gateway.upload(&local, "processed-clip1.mp4").await.unwrap();
        assert!(gateway
            .exists(Namespace::Processed, "processed-clip1.mp4")
            .await
            .unwrap());
        assert!(!gateway.is_public("processed-clip1.mp4").await.unwrap());

        let url = gateway.make_public("processed-clip1.mp4").await.unwrap();
        assert_eq!(
            url,
            "http://localhost:3000/media/processed-videos/processed-clip1.mp4"
        );
        assert!(gateway.is_public("processed-clip1.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_make_public_requires_object() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let result = gateway.make_public("never-uploaded.mp4").await;
        assert!(matches!(result, Err(StorageError::MakePublicFailed(_))));
    }

    #[tokio::test]
    async fn test_remove_clears_object_and_marker() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let local = dir.path().join("out.mp4");
        fs::write(&local, b"rendition").await.unwrap();
        gateway.publish(&local, "processed-a.mp4").await.unwrap();

        gateway.remove("processed-a.mp4").await.unwrap();
        assert!(!gateway
            .exists(Namespace::Processed, "processed-a.mp4")
            .await
            .unwrap());
        assert!(!gateway.is_public("processed-a.mp4").await.unwrap());

        // Removing again is not an error.
        gateway.remove("processed-a.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let gateway = gateway(dir.path()).await;

        let destination = dir.path().join("x");
        let result = gateway.fetch("../../../etc/passwd", &destination).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = gateway.remove("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
