//! Configuration module
//!
//! This module provides configuration structures for the HTTP boundary, the staging
//! area, the remote asset gateway and the transform step.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_DERIVED_ID_PREFIX, DEFAULT_HTTP_CONCURRENCY_LIMIT, DEFAULT_MAX_CONCURRENT_TRANSCODES,
    DEFAULT_PROCESSED_BUCKET, DEFAULT_PROCESSED_STAGING_DIR, DEFAULT_RAW_BUCKET,
    DEFAULT_RAW_STAGING_DIR, DEFAULT_SERVER_PORT, DEFAULT_TARGET_HEIGHT_PX,
};
use crate::models::SourceId;
use crate::storage_types::StorageBackend;

/// Base configuration for the process itself
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Rendition service configuration
#[derive(Clone, Debug)]
pub struct RenditionServiceConfig {
    pub base: BaseConfig,
    // Staging configuration
    pub raw_staging_dir: PathBuf,
    pub processed_staging_dir: PathBuf,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub raw_bucket: String,
    pub processed_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    /// Public URL base for the local backend, served by an external static file server.
    pub local_storage_base_url: String,
    // Transform configuration
    pub ffmpeg_path: String,
    pub target_height_px: u32,
    pub transform_timeout_secs: Option<u64>,
    pub max_concurrent_transcodes: usize,
    // Publishing configuration
    pub derived_id_prefix: String,
    pub retract_partial_publish: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<RenditionServiceConfig>);

impl Config {
    fn as_service(&self) -> &RenditionServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_environment(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = RenditionServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_service().base.http_concurrency_limit
    }

    pub fn raw_staging_dir(&self) -> &PathBuf {
        &self.as_service().raw_staging_dir
    }

    pub fn processed_staging_dir(&self) -> &PathBuf {
        &self.as_service().processed_staging_dir
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_service().storage_backend
    }

    pub fn raw_bucket(&self) -> &str {
        &self.as_service().raw_bucket
    }

    pub fn processed_bucket(&self) -> &str {
        &self.as_service().processed_bucket
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_service().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_service().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_service().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> &str {
        &self.as_service().local_storage_base_url
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_service().ffmpeg_path
    }

    pub fn target_height_px(&self) -> u32 {
        self.as_service().target_height_px
    }

    pub fn transform_timeout_secs(&self) -> Option<u64> {
        self.as_service().transform_timeout_secs
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.as_service().max_concurrent_transcodes
    }

    pub fn derived_id_prefix(&self) -> &str {
        &self.as_service().derived_id_prefix
    }

    pub fn retract_partial_publish(&self) -> bool {
        self.as_service().retract_partial_publish
    }
}

/// Whether an `ENVIRONMENT` value names production.
pub fn is_production_environment(environment: &str) -> bool {
    matches!(environment.to_lowercase().as_str(), "production" | "prod")
}

fn env_limit(name: &str, default: usize) -> Result<usize, anyhow::Error> {
    match env::var(name) {
        Ok(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer, got {:?}", name, s)),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().to_lowercase().parse().ok())
        .unwrap_or(default)
}

impl RenditionServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            http_concurrency_limit: env_limit(
                "HTTP_CONCURRENCY_LIMIT",
                DEFAULT_HTTP_CONCURRENCY_LIMIT,
            )?,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(s.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let target_height_px = env::var("TARGET_HEIGHT_PX")
            .unwrap_or_else(|_| DEFAULT_TARGET_HEIGHT_PX.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("TARGET_HEIGHT_PX must be a positive integer"))?;

        let transform_timeout_secs = match env::var("TRANSFORM_TIMEOUT_SECS") {
            Ok(s) => Some(s.parse::<u64>().map_err(|_| {
                anyhow::anyhow!("TRANSFORM_TIMEOUT_SECS must be a number of seconds")
            })?),
            Err(_) => None,
        };

        let max_concurrent_transcodes =
            env_limit("MAX_CONCURRENT_TRANSCODES", DEFAULT_MAX_CONCURRENT_TRANSCODES)?;

        Ok(RenditionServiceConfig {
            base,
            raw_staging_dir: env::var("RAW_STAGING_DIR")
                .unwrap_or_else(|_| DEFAULT_RAW_STAGING_DIR.to_string())
                .into(),
            processed_staging_dir: env::var("PROCESSED_STAGING_DIR")
                .unwrap_or_else(|_| DEFAULT_PROCESSED_STAGING_DIR.to_string())
                .into(),
            storage_backend,
            raw_bucket: env::var("RAW_BUCKET").unwrap_or_else(|_| DEFAULT_RAW_BUCKET.to_string()),
            processed_bucket: env::var("PROCESSED_BUCKET")
                .unwrap_or_else(|_| DEFAULT_PROCESSED_BUCKET.to_string()),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            target_height_px,
            transform_timeout_secs,
            max_concurrent_transcodes,
            derived_id_prefix: env::var("DERIVED_ID_PREFIX")
                .unwrap_or_else(|_| DEFAULT_DERIVED_ID_PREFIX.to_string()),
            retract_partial_publish: env_flag("RETRACT_PARTIAL_PUBLISH", false),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.raw_staging_dir == self.processed_staging_dir {
            return Err(anyhow::anyhow!(
                "RAW_STAGING_DIR and PROCESSED_STAGING_DIR must be different directories"
            ));
        }

        if self.raw_bucket == self.processed_bucket {
            return Err(anyhow::anyhow!(
                "RAW_BUCKET and PROCESSED_BUCKET must name different namespaces"
            ));
        }

        // The "-2" width rule only yields valid encoder input for an even height.
        if self.target_height_px == 0 || self.target_height_px % 2 != 0 {
            return Err(anyhow::anyhow!(
                "TARGET_HEIGHT_PX must be a positive even number, got {}",
                self.target_height_px
            ));
        }

        if self.derived_id_prefix.is_empty() {
            return Err(anyhow::anyhow!("DERIVED_ID_PREFIX must not be empty"));
        }

        // The prefix becomes part of a local file name, so it follows the source id rules.
        if let Err(e) = SourceId::parse(self.derived_id_prefix.as_str()) {
            return Err(anyhow::anyhow!(
                "DERIVED_ID_PREFIX {:?} is not usable in a file name: {}",
                self.derived_id_prefix,
                e
            ));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be at least 1"));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_TRANSCODES must be at least 1"));
        }

        if self.transform_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!(
                "TRANSFORM_TIMEOUT_SECS must be greater than zero when set"
            ));
        }

        match self.storage_backend.unwrap_or(StorageBackend::S3) {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using the S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using the local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> RenditionServiceConfig {
        RenditionServiceConfig {
            base: BaseConfig {
                server_port: 3000,
                environment: "test".to_string(),
                http_concurrency_limit: 16,
            },
            raw_staging_dir: PathBuf::from("./raw-videos"),
            processed_staging_dir: PathBuf::from("./processed-videos"),
            storage_backend: Some(StorageBackend::Local),
            raw_bucket: "raw-videos".to_string(),
            processed_bucket: "processed-videos".to_string(),
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/tmp/rendition".to_string()),
            local_storage_base_url: "http://localhost:3000/media".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            target_height_px: 360,
            transform_timeout_secs: None,
            max_concurrent_transcodes: 2,
            derived_id_prefix: "processed-".to_string(),
            retract_partial_publish: false,
        }
    }

    #[test]
    fn test_valid_local_config() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_odd_target_height() {
        let mut config = local_config();
        config.target_height_px = 361;
        assert!(config.validate().is_err());
        config.target_height_px = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shared_staging_root() {
        let mut config = local_config();
        config.processed_staging_dir = config.raw_staging_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shared_bucket() {
        let mut config = local_config();
        config.processed_bucket = config.raw_bucket.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_specific_settings_required() {
        let mut config = local_config();
        config.local_storage_path = None;
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());
        config.aws_region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_path_like_derived_prefix() {
        for prefix in ["renditions/", "..", "a\\b", "tab\t"] {
            let mut config = local_config();
            config.derived_id_prefix = prefix.to_string();
            assert!(config.validate().is_err(), "accepted prefix {:?}", prefix);
        }
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = local_config();
        config.base.http_concurrency_limit = 0;
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.max_concurrent_transcodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparsable_limit_is_an_error() {
        std::env::set_var("RENDITION_TEST_LIMIT_TYPO", "1O");
        assert!(env_limit("RENDITION_TEST_LIMIT_TYPO", 4).is_err());
        std::env::set_var("RENDITION_TEST_LIMIT_TYPO", " 8 ");
        assert_eq!(env_limit("RENDITION_TEST_LIMIT_TYPO", 4).unwrap(), 8);
        std::env::remove_var("RENDITION_TEST_LIMIT_TYPO");
        assert_eq!(env_limit("RENDITION_TEST_LIMIT_TYPO", 4).unwrap(), 4);
    }

    #[test]
    fn test_production_detection() {
        let mut inner = local_config();
        inner.base.environment = "Production".to_string();
        assert!(Config(Box::new(inner)).is_production());
        assert!(!Config(Box::new(local_config())).is_production());
    }
}
