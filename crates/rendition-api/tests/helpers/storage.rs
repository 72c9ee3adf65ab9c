use rendition_storage::{LocalGateway, Namespace};
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch directory holding both the local object store and the staging roots.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub base_path: PathBuf,
    pub base_url: String,
}

impl TestStorage {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let base_path = temp_dir.path().to_path_buf();
        let base_url = "http://localhost:3000/media".to_string();
        Self {
            temp_dir,
            base_path,
            base_url,
        }
    }

    pub fn objects_path(&self) -> PathBuf {
        self.base_path.join("objects")
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Place a raw object where the gateway will fetch it from.
pub async fn seed_raw_object(gateway: &LocalGateway, id: &str, bytes: &[u8]) {
    let path = gateway
        .object_path(Namespace::Raw, id)
        .expect("valid object id");
    tokio::fs::write(path, bytes)
        .await
        .expect("Failed to seed raw object");
}
