// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use inpaint_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    diffusion::DiffusionClient,
    storage::OutputStore,
    version,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads environment fallbacks
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::parse();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    info!("📦 {}", version::get_version_string());

    let device = config.device.resolve();
    info!("Using device: {} ({})", device, device.precision().as_str());

    let client = DiffusionClient::with_timeout(
        &config.diffusion_endpoint,
        &config.model_id,
        device,
        config.sidecar_timeout(),
    )?;

    info!("🧠 Initializing inpainting pipeline...");
    if !client.is_healthy().await {
        warn!(
            "Diffusion sidecar at {} did not answer its health check; trying to load anyway",
            client.endpoint()
        );
    }
    client
        .load_model(&config.model_cache_dir)
        .await
        .with_context(|| format!("failed to load pipeline {}", config.model_id))?;
    match client.list_models().await {
        Ok(models) if models.iter().any(|m| m == client.model_name()) => {
            info!("Sidecar reports {} models, including {}", models.len(), client.model_name())
        }
        Ok(models) => warn!(
            "Sidecar model list {:?} does not include {}",
            models,
            client.model_name()
        ),
        Err(e) => warn!("Could not list sidecar models: {}", e),
    }
    info!("✅ Pipeline initialization complete");

    let store = OutputStore::new(&config.output_dir)
        .await
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let state = AppState::new(
        Arc::new(client),
        store,
        config.inpaint_settings(),
        config.max_concurrent_generations,
    );

    start_server(&config.listen_addr, state).await
}
