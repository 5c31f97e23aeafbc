// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, info};

use super::request::{InpaintUpload, IMAGE_FIELD, MASK_FIELD};
use super::response::InpaintResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::diffusion::InpaintRequest;
use crate::vision::{decode_image_bytes_with_limit, prepare_inputs, PreparedInputs};

/// POST /inpaint - Regenerate the masked region of an image
///
/// Pipeline:
/// 1. Collect `image` and `mask` form fields (400 if either is missing)
/// 2. Decode both uploads (422 on failure, including uploads over the limit)
/// 3. Convert to RGB / grayscale, resize to the working size, invert the mask
/// 4. Run the pipeline through the generation guard (502/503 on failure)
/// 5. Persist the first generated image as PNG (500 on failure)
/// 6. Return the stored filename
pub async fn inpaint_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<InpaintResponse>, ApiError> {
    let max_bytes = state.settings.max_upload_bytes;
    let upload = InpaintUpload::from_multipart(multipart, max_bytes).await?;
    let (image_bytes, mask_bytes) = upload.into_files()?;

    debug!(
        "Inpaint request received: image={} bytes, mask={} bytes",
        image_bytes.len(),
        mask_bytes.len()
    );

    // Decoding and resampling are CPU-bound
    let working_size = state.settings.working_size;
    let prepared = tokio::task::spawn_blocking(move || -> Result<PreparedInputs, ApiError> {
        let (image, image_info) = decode_image_bytes_with_limit(&image_bytes, max_bytes)
            .map_err(|e| ApiError::decode(IMAGE_FIELD, e))?;
        let (mask, mask_info) = decode_image_bytes_with_limit(&mask_bytes, max_bytes)
            .map_err(|e| ApiError::decode(MASK_FIELD, e))?;

        debug!(
            "Decoded image {}x{} {:?}, mask {}x{} {:?}",
            image_info.width,
            image_info.height,
            image_info.format,
            mask_info.width,
            mask_info.height,
            mask_info.format
        );

        Ok(prepare_inputs(&image, &mask, working_size))
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("preprocessing task failed: {}", e)))??;

    let request = InpaintRequest::new(
        state.settings.prompt.clone(),
        prepared,
        state.settings.steps,
        state.settings.guidance_scale,
    )?;

    let output = state.pipeline.inpaint(request).await?;
    let filename = state.store.save_png(&output).await?;

    info!(
        "Inpainted image saved: {} ({}x{})",
        filename,
        output.width(),
        output.height()
    );

    Ok(Json(InpaintResponse::success(filename)))
}
