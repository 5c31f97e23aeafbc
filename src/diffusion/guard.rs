// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded access to the shared inpainting pipeline

use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::pipeline::{GenerationError, InpaintPipeline, InpaintRequest, PipelineInfo};

/// Serializes generation calls into the single loaded pipeline.
///
/// At most `max_concurrent` calls run at once; the rest wait in FIFO order
/// for a permit.
pub struct PipelineGuard {
    pipeline: Arc<dyn InpaintPipeline>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl PipelineGuard {
    pub fn new(pipeline: Arc<dyn InpaintPipeline>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Wait for a slot, then run the pipeline
    pub async fn inpaint(&self, request: InpaintRequest) -> Result<RgbImage, GenerationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GenerationError::Unavailable("generation guard closed".to_string()))?;

        debug!(
            "Generation slot acquired ({}/{} free)",
            self.permits.available_permits(),
            self.max_concurrent
        );

        let start = Instant::now();
        let result = self.pipeline.inpaint(request).await;
        if result.is_ok() {
            info!("Inpainting completed in {}ms", start.elapsed().as_millis());
        }
        result
    }

    /// Reject further generations; in-flight calls finish normally
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn info(&self) -> PipelineInfo {
        self.pipeline.info()
    }

    pub async fn health_check(&self) -> bool {
        !self.permits.is_closed() && self.pipeline.health_check().await
    }
}
