// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::inpaint::inpaint_handler;
use super::output::get_output_handler;
use crate::config::InpaintSettings;
use crate::diffusion::{ComputeDevice, InpaintPipeline, PipelineGuard};
use crate::storage::OutputStore;

/// Shared state handed to every handler
///
/// Built once at startup; the pipeline handle lives here instead of in a global.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineGuard>,
    pub store: Arc<OutputStore>,
    pub settings: Arc<InpaintSettings>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<dyn InpaintPipeline>,
        store: OutputStore,
        settings: InpaintSettings,
        max_concurrent_generations: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(PipelineGuard::new(pipeline, max_concurrent_generations)),
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Build tag, date and feature list
    pub build: serde_json::Value,
    pub model: String,
    pub device: ComputeDevice,
    pub working_size: u32,
    pub available_generation_slots: usize,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/inpaint", post(inpaint_handler))
        .route("/output/:filename", get(get_output_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn start_server(listen_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let pipeline = state.pipeline.clone();
    let app = create_app(state);

    tracing::info!("🚀 Inpaint API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            pipeline.close();
        })
        .await?;

    tracing::info!("Inpaint API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.pipeline.info();
    let healthy = state.pipeline.health_check().await;

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        build: crate::version::get_version_info(),
        model: info.model,
        device: info.device,
        working_size: state.settings.working_size,
        available_generation_slots: state.pipeline.available_slots(),
    })
}
