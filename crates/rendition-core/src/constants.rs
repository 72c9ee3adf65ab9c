//! Defaults shared by configuration and the pipeline.

/// Prefix applied to a source id to name its published rendition.
pub const DEFAULT_DERIVED_ID_PREFIX: &str = "processed-";

/// Output height of the rendition; width follows the source aspect ratio.
pub const DEFAULT_TARGET_HEIGHT_PX: u32 = 360;

pub const DEFAULT_RAW_STAGING_DIR: &str = "./raw-videos";
pub const DEFAULT_PROCESSED_STAGING_DIR: &str = "./processed-videos";

pub const DEFAULT_RAW_BUCKET: &str = "raw-videos";
pub const DEFAULT_PROCESSED_BUCKET: &str = "processed-videos";

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONCURRENT_TRANSCODES: usize = 2;
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1024;
