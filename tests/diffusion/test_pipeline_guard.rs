// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PipelineGuard concurrency bounds

use async_trait::async_trait;
use image::{GrayImage, Luma, Rgb, RgbImage};
use inpaint_node::{
    diffusion::{
        ComputeDevice, GenerationError, InpaintPipeline, InpaintRequest, PipelineGuard,
        PipelineInfo,
    },
    vision::PreparedInputs,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

/// Sleeps during generation and records peak concurrency
#[derive(Default)]
struct SlowPipeline {
    running: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl InpaintPipeline for SlowPipeline {
    async fn inpaint(&self, request: InpaintRequest) -> Result<RgbImage, GenerationError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RgbImage::from_pixel(request.width(), request.height(), Rgb([1, 2, 3])))
    }

    fn info(&self) -> PipelineInfo {
        PipelineInfo {
            model: "slow".to_string(),
            device: ComputeDevice::Cpu,
        }
    }
}

fn request() -> InpaintRequest {
    let inputs = PreparedInputs {
        image: RgbImage::new(8, 8),
        mask: GrayImage::from_pixel(8, 8, Luma([255])),
    };
    InpaintRequest::new("p", inputs, 1, 1.0).unwrap()
}

async fn run_concurrently(guard: Arc<PipelineGuard>, count: usize) {
    let handles: Vec<_> = (0..count)
        .map(|_| {
            let guard = guard.clone();
            tokio::spawn(async move { guard.inpaint(request()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_permit_serializes_generations() {
    let pipeline = Arc::new(SlowPipeline::default());
    let guard = Arc::new(PipelineGuard::new(pipeline.clone(), 1));

    run_concurrently(guard, 5).await;

    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 5);
    assert_eq!(pipeline.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_peak_never_exceeds_permits() {
    let pipeline = Arc::new(SlowPipeline::default());
    let guard = Arc::new(PipelineGuard::new(pipeline.clone(), 2));

    run_concurrently(guard.clone(), 8).await;

    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 8);
    assert!(pipeline.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(guard.available_slots(), 2);
}

#[test]
fn test_zero_permits_rounds_up_to_one() {
    let guard = PipelineGuard::new(Arc::new(SlowPipeline::default()), 0);
    assert_eq!(guard.max_concurrent(), 1);
    assert_eq!(guard.available_slots(), 1);
    assert_eq!(guard.info().model, "slow");
}

#[tokio::test]
async fn test_closed_guard_rejects_generation() {
    let pipeline = Arc::new(SlowPipeline::default());
    let guard = PipelineGuard::new(pipeline.clone(), 1);
    assert!(guard.health_check().await);

    guard.close();

    let result = guard.inpaint(request()).await;
    assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    assert!(!guard.health_check().await);
    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);
}
