#[cfg(feature = "storage-local")]
use crate::LocalGateway;
#[cfg(feature = "storage-s3")]
use crate::S3Gateway;
use crate::{AssetGateway, StorageBackend, StorageError, StorageResult};
use rendition_core::Config;
use std::sync::Arc;

/// Create a remote asset gateway based on configuration
pub async fn create_gateway(config: &Config) -> StorageResult<Arc<dyn AssetGateway>> {
    let backend = config.storage_backend().unwrap_or(StorageBackend::S3);
    let raw_bucket = config.raw_bucket().to_string();
    let processed_bucket = config.processed_bucket().to_string();

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config
                .s3_region()
                .or_else(|| config.aws_region())
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let gateway = S3Gateway::new(raw_bucket, processed_bucket, region, endpoint).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config.local_storage_base_url().to_string();

            let gateway =
                LocalGateway::new(base_path, base_url, raw_bucket, processed_bucket).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
