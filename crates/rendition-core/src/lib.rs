//! Rendition Core Library
//!
//! This crate provides the job model, error types and configuration shared by the
//! storage, processing and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{is_production_environment, BaseConfig, Config, RenditionServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{derive_id, Job, JobId, JobOutcome, JobState, SourceId, Stage};
pub use storage_types::StorageBackend;
