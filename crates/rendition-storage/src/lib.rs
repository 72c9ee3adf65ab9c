//! Rendition Storage Library
//!
//! This crate provides the remote asset gateway: the capability the pipeline uses to
//! fetch raw objects and publish renditions. It includes the `AssetGateway` trait and
//! implementations for S3 and the local filesystem.
//!
//! # Namespaces
//!
//! Every gateway is bound to two namespaces (buckets): `raw`, which is only ever read
//! by `fetch`, and `processed`, which is only ever written by `publish`. Object ids
//! must not contain `..` or start with `/`; validation is shared in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_gateway;
#[cfg(feature = "storage-local")]
pub use local::LocalGateway;
pub use rendition_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Gateway;
pub use traits::{AssetGateway, Namespace, StorageError, StorageResult};
