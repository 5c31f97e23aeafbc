// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for API tests: stub pipeline, multipart bodies, test app
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use image::{GrayImage, Rgb, RgbImage};
use inpaint_node::{
    api::{create_app, AppState},
    config::InpaintSettings,
    diffusion::{ComputeDevice, GenerationError, InpaintPipeline, InpaintRequest, PipelineInfo},
    storage::OutputStore,
    vision::{encode_gray_png, encode_rgb_png},
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "inpaint-test-boundary";

/// What the stub does when called
#[derive(Debug, Clone)]
pub enum StubBehaviour {
    /// Return a solid image at the request's dimensions
    Fill(Rgb<u8>),
    /// Fail as if the sidecar answered with an error
    FailUpstream,
    /// Fail as if the sidecar could not be reached
    FailUnavailable,
}

/// Pipeline stand-in that records every request it receives
pub struct StubPipeline {
    behaviour: StubBehaviour,
    requests: Mutex<Vec<InpaintRequest>>,
    outputs: Mutex<Vec<RgbImage>>,
}

impl StubPipeline {
    pub fn new(behaviour: StubBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<InpaintRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn outputs(&self) -> Vec<RgbImage> {
        self.outputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl InpaintPipeline for StubPipeline {
    async fn inpaint(&self, request: InpaintRequest) -> Result<RgbImage, GenerationError> {
        let (width, height) = (request.width(), request.height());
        self.requests.lock().unwrap().push(request);

        match &self.behaviour {
            StubBehaviour::Fill(color) => {
                let output = RgbImage::from_pixel(width, height, *color);
                self.outputs.lock().unwrap().push(output.clone());
                Ok(output)
            }
            StubBehaviour::FailUpstream => Err(GenerationError::Upstream {
                status: 500,
                body: "RuntimeError: CUDA out of memory".to_string(),
            }),
            StubBehaviour::FailUnavailable => Err(GenerationError::Unavailable(
                "connection refused".to_string(),
            )),
        }
    }

    fn info(&self) -> PipelineInfo {
        PipelineInfo {
            model: "stub-inpainting".to_string(),
            device: ComputeDevice::Cpu,
        }
    }
}

/// Test app with its own output directory
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub pipeline: Arc<StubPipeline>,
    pub store: OutputStore,
    pub output_dir: TempDir,
}

impl TestApp {
    pub async fn new(behaviour: StubBehaviour) -> Self {
        Self::with_settings(behaviour, InpaintSettings::default()).await
    }

    pub async fn with_settings(behaviour: StubBehaviour, settings: InpaintSettings) -> Self {
        let output_dir = TempDir::new().unwrap();
        let store = OutputStore::new(output_dir.path()).await.unwrap();
        let pipeline = StubPipeline::new(behaviour);

        let state = AppState::new(pipeline.clone(), store.clone(), settings, 1);

        Self {
            app: create_app(state.clone()),
            state,
            pipeline,
            store,
            output_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Files currently in the output directory
    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.output_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

/// One file part of a multipart form
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

pub fn png_part<'a>(name: &'a str, data: Vec<u8>) -> Part<'a> {
    Part {
        name,
        filename: if name == "mask" { "mask.png" } else { "image.png" },
        content_type: "image/png",
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn inpaint_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/inpaint")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn rgb_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode_rgb_png(&image).unwrap()
}

/// PNG of pseudo-random pixels; does not compress, so its size tracks `width * height * 3`
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    let image = RgbImage::from_fn(width, height, |_, _| {
        let v = next().to_le_bytes();
        Rgb([v[0], v[1], v[2]])
    });
    encode_rgb_png(&image).unwrap()
}

pub fn gray_png(mask: &GrayImage) -> Vec<u8> {
    encode_gray_png(mask).unwrap()
}
