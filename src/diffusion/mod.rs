// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting via a diffusion sidecar hosting Stable Diffusion 2 inpainting

pub mod client;
pub mod device;
pub mod guard;
pub mod pipeline;

pub use client::{DiffusionClient, ImageEditRequest, ImageSize, ModelLoadRequest};
pub use device::{ComputeDevice, DevicePreference, DeviceProbe, Precision};
pub use guard::PipelineGuard;
pub use pipeline::{GenerationError, InpaintPipeline, InpaintRequest, PipelineInfo};
