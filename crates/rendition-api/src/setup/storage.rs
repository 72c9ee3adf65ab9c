//! Remote gateway setup

use anyhow::{Context, Result};
use rendition_core::Config;
use rendition_storage::{create_gateway, AssetGateway};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn AssetGateway>> {
    let gateway = create_gateway(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %gateway.backend_type(),
        raw_bucket = %config.raw_bucket(),
        processed_bucket = %config.processed_bucket(),
        "Storage backend initialized"
    );

    Ok(gateway)
}
