// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration: command-line flags with environment fallbacks

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::diffusion::{client::DEFAULT_TIMEOUT, DevicePreference};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_DIFFUSION_ENDPOINT: &str = "http://127.0.0.1:8082";
pub const DEFAULT_MODEL_ID: &str = "stabilityai/stable-diffusion-2-inpainting";
pub const DEFAULT_MODEL_CACHE_DIR: &str = "./models/stable_diffusion_inpainting";
pub const DEFAULT_PROMPT: &str = "Fill this image based on the context of this image";
pub const DEFAULT_WORKING_SIZE: u32 = 128;
pub const DEFAULT_STEPS: u32 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const MIN_WORKING_SIZE: u32 = 64;
const MAX_WORKING_SIZE: u32 = 2048;

/// Inpaint Node
#[derive(Parser, Debug, Clone)]
#[command(name = "inpaint-node")]
#[command(version)]
#[command(about = "HTTP inpainting service backed by a diffusion sidecar", long_about = None)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Directory generated images are written to
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Base URL of the diffusion sidecar
    #[arg(long, env = "DIFFUSION_ENDPOINT", default_value = DEFAULT_DIFFUSION_ENDPOINT)]
    pub diffusion_endpoint: String,

    /// Pretrained inpainting pipeline to load
    #[arg(long, env = "DIFFUSION_MODEL", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Where the sidecar caches downloaded weights
    #[arg(long, env = "MODEL_CACHE_DIR", default_value = DEFAULT_MODEL_CACHE_DIR)]
    pub model_cache_dir: String,

    /// Compute backend
    #[arg(long, env = "DIFFUSION_DEVICE", value_enum, default_value = "auto")]
    pub device: DevicePreference,

    /// Square resolution inputs are resized to
    #[arg(long, env = "INPAINT_WORKING_SIZE", default_value_t = DEFAULT_WORKING_SIZE)]
    pub working_size: u32,

    /// Denoising steps per generation
    #[arg(long, env = "INPAINT_STEPS", default_value_t = DEFAULT_STEPS)]
    pub steps: u32,

    /// Classifier-free guidance scale
    #[arg(long, env = "INPAINT_GUIDANCE_SCALE", default_value_t = DEFAULT_GUIDANCE_SCALE)]
    pub guidance_scale: f32,

    /// Prompt sent with every generation
    #[arg(long, env = "INPAINT_PROMPT", default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Generations allowed to run against the pipeline at once
    #[arg(long, env = "MAX_CONCURRENT_GENERATIONS", default_value_t = 1)]
    pub max_concurrent_generations: usize,

    /// Request body limit for uploads
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Timeout for a single sidecar call
    #[arg(long, env = "SIDECAR_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub sidecar_timeout_secs: u64,
}

/// Per-request parameters shared by handlers
#[derive(Debug, Clone, PartialEq)]
pub struct InpaintSettings {
    pub working_size: u32,
    pub prompt: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub max_upload_bytes: usize,
}

impl Default for InpaintSettings {
    fn default() -> Self {
        Self {
            working_size: DEFAULT_WORKING_SIZE,
            prompt: DEFAULT_PROMPT.to_string(),
            steps: DEFAULT_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl NodeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.trim().is_empty() {
            return Err("listen address must not be empty".to_string());
        }
        if self.model_id.trim().is_empty() {
            return Err("model id must not be empty".to_string());
        }
        if self.max_concurrent_generations == 0 {
            return Err("max concurrent generations must be at least 1".to_string());
        }
        if self.sidecar_timeout_secs == 0 {
            return Err("sidecar timeout must be at least 1 second".to_string());
        }
        self.inpaint_settings().validate()
    }

    pub fn inpaint_settings(&self) -> InpaintSettings {
        InpaintSettings {
            working_size: self.working_size,
            prompt: self.prompt.clone(),
            steps: self.steps,
            guidance_scale: self.guidance_scale,
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn sidecar_timeout(&self) -> Duration {
        Duration::from_secs(self.sidecar_timeout_secs)
    }
}

impl InpaintSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.working_size < MIN_WORKING_SIZE
            || self.working_size > MAX_WORKING_SIZE
            || self.working_size % 8 != 0
        {
            return Err(format!(
                "working size must be a multiple of 8 between {} and {}, got {}",
                MIN_WORKING_SIZE, MAX_WORKING_SIZE, self.working_size
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        if self.steps == 0 || self.steps > 100 {
            return Err(format!(
                "steps must be between 1 and 100, got {}",
                self.steps
            ));
        }
        if !self.guidance_scale.is_finite() || self.guidance_scale < 0.0 {
            return Err(format!(
                "guidance scale must be a non-negative number, got {}",
                self.guidance_scale
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err("max upload bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}
