//! Remote asset gateway trait
//!
//! This module defines the `AssetGateway` trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Make-public failed: {0}")]
    MakePublicFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid object id: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The two namespaces a gateway is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Raw,
    Processed,
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Namespace::Raw => write!(f, "raw"),
            Namespace::Processed => write!(f, "processed"),
        }
    }
}

/// Remote asset gateway
///
/// Passed into the orchestrator at construction so tests can substitute a fake.
/// Every call is a single attempt: there are no retries, and a transient failure
/// surfaces immediately as `TransferFailed`.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Download the raw object `source_id` into `destination`, returning the number
    /// of bytes written. A partially written file may be left behind on failure.
    async fn fetch(&self, source_id: &str, destination: &Path) -> StorageResult<u64>;

    /// Upload `local_path` into the processed namespace under `destination_id`.
    /// The object is private until `make_public` succeeds.
    async fn upload(&self, local_path: &Path, destination_id: &str) -> StorageResult<()>;

    /// Mark a processed object publicly readable and return its public URL.
    async fn make_public(&self, destination_id: &str) -> StorageResult<String>;

    /// Upload followed by make-public.
    ///
    /// The two steps are not atomic: if `make_public` fails the uploaded object
    /// stays in the processed namespace as a private object.
    async fn publish(&self, local_path: &Path, destination_id: &str) -> StorageResult<String> {
        self.upload(local_path, destination_id).await?;
        self.make_public(destination_id).await
    }

    /// Delete a processed object. Deleting an absent object succeeds.
    async fn remove(&self, destination_id: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
