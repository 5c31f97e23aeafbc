// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting pipeline abstraction
//!
//! Handlers only see [`InpaintPipeline`]; the production implementation is the
//! sidecar [`DiffusionClient`](super::client::DiffusionClient).

use async_trait::async_trait;
use image::{GrayImage, RgbImage};
use serde::Serialize;
use thiserror::Error;

use super::device::ComputeDevice;
use crate::vision::PreparedInputs;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("diffusion pipeline unavailable: {0}")]
    Unavailable(String),

    #[error("diffusion sidecar returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid response from diffusion sidecar: {0}")]
    InvalidResponse(String),

    #[error("diffusion request timed out")]
    Timeout,

    #[error("image is {image:?} but mask is {mask:?}")]
    DimensionMismatch { image: (u32, u32), mask: (u32, u32) },

    #[error("failed to encode pipeline input: {0}")]
    Encode(String),
}

/// Static description of the loaded pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInfo {
    pub model: String,
    pub device: ComputeDevice,
}

/// One inpainting call
#[derive(Debug, Clone)]
pub struct InpaintRequest {
    pub prompt: String,
    pub image: RgbImage,
    pub mask: GrayImage,
    pub steps: u32,
    pub guidance_scale: f32,
}

impl InpaintRequest {
    /// Build a request; the image and mask must share dimensions
    pub fn new(
        prompt: impl Into<String>,
        inputs: PreparedInputs,
        steps: u32,
        guidance_scale: f32,
    ) -> Result<Self, GenerationError> {
        let PreparedInputs { image, mask } = inputs;
        if image.dimensions() != mask.dimensions() {
            return Err(GenerationError::DimensionMismatch {
                image: image.dimensions(),
                mask: mask.dimensions(),
            });
        }

        Ok(Self {
            prompt: prompt.into(),
            image,
            mask,
            steps,
            guidance_scale,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[async_trait]
pub trait InpaintPipeline: Send + Sync {
    /// Run the pipeline and return the first generated image
    async fn inpaint(&self, request: InpaintRequest) -> Result<RgbImage, GenerationError>;

    fn info(&self) -> PipelineInfo;

    async fn health_check(&self) -> bool {
        true
    }
}
