// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod diffusion;
pub mod storage;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{create_app, AppState};
pub use config::{InpaintSettings, NodeConfig};
pub use diffusion::{DiffusionClient, InpaintPipeline, InpaintRequest, PipelineGuard};
pub use storage::OutputStore;
