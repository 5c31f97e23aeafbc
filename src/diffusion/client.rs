// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Diffusion sidecar client for inpainting via an OpenAI-compatible images API

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::device::ComputeDevice;
use super::pipeline::{GenerationError, InpaintPipeline, InpaintRequest, PipelineInfo};
use crate::vision::{decode_base64_image, encode_gray_base64, encode_rgb_base64};

/// Default request timeout; a 50-step run on CPU takes minutes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Health probes must answer quickly even while a generation is running
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for calling a diffusion sidecar via OpenAI-compatible API
pub struct DiffusionClient {
    client: Client,
    endpoint: String,
    model_name: String,
    device: ComputeDevice,
}

/// Body of `POST /v1/models/load`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelLoadRequest {
    pub model: String,
    pub device: String,
    pub dtype: String,
    pub cache_dir: String,
}

/// Body of `POST /v1/images/edits`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEditRequest {
    pub prompt: String,
    pub model: String,
    /// Base64 PNG
    pub image: String,
    /// Base64 PNG, black marks the region to regenerate
    pub mask: String,
    pub size: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub n: u32,
    pub response_format: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

// --- OpenAI-compatible response types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIImageResponse {
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIImageData {
    pub b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelList {
    data: Vec<OpenAIModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelEntry {
    id: String,
}

// --- Implementations ---

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl ImageEditRequest {
    /// Encode an inpainting request for the sidecar
    pub fn from_inpaint(
        request: &InpaintRequest,
        model: &str,
    ) -> std::result::Result<Self, GenerationError> {
        let image =
            encode_rgb_base64(&request.image).map_err(|e| GenerationError::Encode(e.to_string()))?;
        let mask =
            encode_gray_base64(&request.mask).map_err(|e| GenerationError::Encode(e.to_string()))?;
        let size = ImageSize {
            width: request.width(),
            height: request.height(),
        };

        Ok(Self {
            prompt: request.prompt.clone(),
            model: model.to_string(),
            image,
            mask,
            size: size.to_string(),
            num_inference_steps: request.steps,
            guidance_scale: request.guidance_scale,
            n: 1,
            response_format: "b64_json".to_string(),
        })
    }
}

impl DiffusionClient {
    /// Create a new DiffusionClient
    pub fn new(endpoint: &str, model_name: &str, device: ComputeDevice) -> Result<Self> {
        Self::with_timeout(endpoint, model_name, device, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: &str,
        model_name: &str,
        device: ComputeDevice,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Diffusion client configured: endpoint={}, model={}, device={}",
            endpoint, model_name, device
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            device,
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Get the endpoint (without trailing slash)
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn device(&self) -> ComputeDevice {
        self.device
    }

    /// Check if the diffusion sidecar is healthy
    pub async fn is_healthy(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Diffusion health check failed: {}", e);
                false
            }
        }
    }

    /// Ask the sidecar to load the pipeline weights onto the selected device
    ///
    /// Called once at startup; weights are cached under `cache_dir`.
    pub async fn load_model(&self, cache_dir: &str) -> Result<()> {
        let body = ModelLoadRequest {
            model: self.model_name.clone(),
            device: self.device.as_str().to_string(),
            dtype: self.device.precision().as_str().to_string(),
            cache_dir: cache_dir.to_string(),
        };

        let url = format!("{}/v1/models/load", self.endpoint);
        debug!("Diffusion load_model POST {}", url);

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "diffusion sidecar returned {} while loading {}: {}",
                status,
                self.model_name,
                text
            ));
        }

        info!(
            "Diffusion pipeline loaded: model={}, device={}, dtype={}",
            body.model, body.device, body.dtype
        );
        Ok(())
    }

    /// List available models from the diffusion sidecar
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.endpoint);
        debug!("Diffusion list_models GET {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "diffusion sidecar returned {}: {}",
                status,
                text
            ));
        }

        let model_list: OpenAIModelList = response.json().await?;
        Ok(model_list.data.into_iter().map(|m| m.id).collect())
    }
}

fn map_transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_connect() {
        GenerationError::Unavailable(e.to_string())
    } else {
        GenerationError::InvalidResponse(e.to_string())
    }
}

#[async_trait]
impl InpaintPipeline for DiffusionClient {
    async fn inpaint(
        &self,
        request: InpaintRequest,
    ) -> std::result::Result<RgbImage, GenerationError> {
        let body = ImageEditRequest::from_inpaint(&request, &self.model_name)?;
        let start = Instant::now();

        let url = format!("{}/v1/images/edits", self.endpoint);
        debug!("Diffusion inpaint POST {} size={}", url, body.size);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream { status, body: text });
        }

        let api_response: OpenAIImageResponse =
            response.json().await.map_err(map_transport_error)?;
        let first = api_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("empty data array".to_string()))?;

        let b64 = first
            .b64_json
            .ok_or_else(|| GenerationError::InvalidResponse("no b64_json in response".to_string()))?;

        let (image, info) = decode_base64_image(&b64)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        debug!(
            "Diffusion inpaint finished in {}ms ({}x{} {:?})",
            start.elapsed().as_millis(),
            info.width,
            info.height,
            info.format
        );

        Ok(image.to_rgb8())
    }

    fn info(&self) -> PipelineInfo {
        PipelineInfo {
            model: self.model_name.clone(),
            device: self.device,
        }
    }

    async fn health_check(&self) -> bool {
        self.is_healthy().await
    }
}
