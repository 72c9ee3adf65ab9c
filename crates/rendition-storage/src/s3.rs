use crate::keys::{content_type_for, validate_object_id};
use crate::traits::{AssetGateway, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// S3 gateway implementation
///
/// Raw objects are read from `raw_bucket`, renditions are written to
/// `processed_bucket` and made public with a `public-read` canned ACL.
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
    raw_bucket: String,
    processed_bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Gateway {
    /// Create a new S3Gateway instance
    ///
    /// # Arguments
    /// * `raw_bucket` - bucket holding incoming raw videos
    /// * `processed_bucket` - bucket receiving published renditions
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        raw_bucket: String,
        processed_bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Ok(S3Gateway {
            client: Client::from_conf(builder.build()),
            raw_bucket,
            processed_bucket,
            region,
            endpoint_url,
        })
    }

    /// Generate public URL for a processed object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style URLs on the endpoint
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.processed_bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.processed_bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl AssetGateway for S3Gateway {
    async fn fetch(&self, source_id: &str, destination: &Path) -> StorageResult<u64> {
        validate_object_id(source_id)?;
        let start = std::time::Instant::now();

        let output = self
            .client
            .get_object()
            .bucket(&self.raw_bucket)
            .key(source_id)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(format!("{}/{}", self.raw_bucket, source_id))
                } else {
                    tracing::error!(
                        error = %service_error,
                        bucket = %self.raw_bucket,
                        key = %source_id,
                        "S3 fetch failed"
                    );
                    StorageError::TransferFailed(service_error.to_string())
                }
            })?;

        let mut file = tokio::fs::File::create(destination).await.map_err(|e| {
            StorageError::TransferFailed(format!(
                "Failed to create {}: {}",
                destination.display(),
                e
            ))
        })?;

        let mut body = Box::pin(output.body.into_async_read());
        let size = tokio::io::copy(&mut body, &mut file).await.map_err(|e| {
            StorageError::TransferFailed(format!(
                "Failed to stream s3://{}/{} to {}: {}",
                self.raw_bucket,
                source_id,
                destination.display(),
                e
            ))
        })?;
        file.flush().await?;

        tracing::info!(
            bucket = %self.raw_bucket,
            key = %source_id,
            destination = %destination.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 fetch successful"
        );

        Ok(size)
    }

    async fn upload(&self, local_path: &Path, destination_id: &str) -> StorageResult<()> {
        validate_object_id(destination_id)?;
        let start = std::time::Instant::now();

        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            StorageError::TransferFailed(format!(
                "Failed to open {}: {}",
                local_path.display(),
                e
            ))
        })?;

        self.client
            .put_object()
            .bucket(&self.processed_bucket)
            .key(destination_id)
            .content_type(content_type_for(destination_id))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                tracing::error!(
                    error = %service_error,
                    bucket = %self.processed_bucket,
                    key = %destination_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::TransferFailed(service_error.to_string())
            })?;

        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn make_public(&self, destination_id: &str) -> StorageResult<String> {
        validate_object_id(destination_id)?;

        self.client
            .put_object_acl()
            .bucket(&self.processed_bucket)
            .key(destination_id)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                tracing::error!(
                    error = %service_error,
                    bucket = %self.processed_bucket,
                    key = %destination_id,
                    "S3 make-public failed"
                );
                StorageError::MakePublicFailed(service_error.to_string())
            })?;

        let url = self.generate_url(destination_id);
        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            url = %url,
            "S3 object made public"
        );

        Ok(url)
    }

    async fn remove(&self, destination_id: &str) -> StorageResult<()> {
        validate_object_id(destination_id)?;

        self.client
            .delete_object()
            .bucket(&self.processed_bucket)
            .key(destination_id)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                tracing::error!(
                    error = %service_error,
                    bucket = %self.processed_bucket,
                    key = %destination_id,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(service_error.to_string())
            })?;

        tracing::info!(
            bucket = %self.processed_bucket,
            key = %destination_id,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
