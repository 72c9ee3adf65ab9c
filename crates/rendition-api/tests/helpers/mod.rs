//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p rendition-api`.

pub mod storage;
pub mod transcoder;

use axum_test::TestServer;
use rendition_api::setup::{build_state, routes};
use rendition_core::{BaseConfig, Config, RenditionServiceConfig, StorageBackend};
use rendition_processing::{StagingArea, StagingRole};
use rendition_storage::LocalGateway;
use std::path::PathBuf;
use std::sync::Arc;

use self::storage::TestStorage;
use self::transcoder::FakeTranscoder;

/// Test application: server plus the collaborators it was built from.
pub struct TestApp {
    pub server: TestServer,
    pub gateway: Arc<LocalGateway>,
    pub transcoder: Arc<FakeTranscoder>,
    pub staging: StagingArea,
    pub _storage: TestStorage,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files left behind in either staging root.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        [StagingRole::Raw, StagingRole::Processed]
            .into_iter()
            .filter_map(|role| std::fs::read_dir(self.staging.root(role)).ok())
            .flat_map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())))
            .collect()
    }
}

pub fn create_test_config(storage: &TestStorage) -> Config {
    Config(Box::new(RenditionServiceConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            http_concurrency_limit: 64,
        },
        raw_staging_dir: storage.base_path.join("staging/raw-videos"),
        processed_staging_dir: storage.base_path.join("staging/processed-videos"),
        storage_backend: Some(StorageBackend::Local),
        raw_bucket: "raw-videos".to_string(),
        processed_bucket: "processed-videos".to_string(),
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(storage.objects_path().to_string_lossy().to_string()),
        local_storage_base_url: storage.base_url.clone(),
        ffmpeg_path: "ffmpeg".to_string(),
        target_height_px: 360,
        transform_timeout_secs: None,
        max_concurrent_transcodes: 2,
        derived_id_prefix: "processed-".to_string(),
        retract_partial_publish: false,
    }))
}

/// Setup test app with a local-filesystem gateway and a fake transcoder.
pub async fn setup_test_app() -> TestApp {
    let storage = TestStorage::new();
    let config = create_test_config(&storage);
    config.validate().expect("test config should be valid");

    let gateway = Arc::new(
        LocalGateway::new(
            storage.objects_path(),
            storage.base_url.clone(),
            config.raw_bucket().to_string(),
            config.processed_bucket().to_string(),
        )
        .await
        .expect("Failed to create local gateway"),
    );
    let transcoder = Arc::new(FakeTranscoder::default());

    let staging = StagingArea::from_config(&config);
    staging
        .ensure_directories()
        .await
        .expect("Failed to create staging directories");

    let state = build_state(
        config.clone(),
        gateway.clone(),
        transcoder.clone(),
        staging.clone(),
    );
    let router = routes::setup_routes(&config, state);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        gateway,
        transcoder,
        staging,
        _storage: storage,
    }
}
