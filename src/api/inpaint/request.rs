// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting multipart request and validation

use axum::http::StatusCode;
use axum_extra::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::api::errors::ApiError;
use crate::vision::ImageError;

/// Form field carrying the source image
pub const IMAGE_FIELD: &str = "image";

/// Form field carrying the mask
pub const MASK_FIELD: &str = "mask";

/// Returned for any multipart parse failure other than the size limit
pub const MALFORMED_FORM_MESSAGE: &str = "Malformed multipart form";

/// Files collected from a POST /inpaint form
#[derive(Debug, Clone, Default)]
pub struct InpaintUpload {
    pub image: Option<Bytes>,
    pub mask: Option<Bytes>,
}

impl InpaintUpload {
    /// Drain the form; unknown fields are skipped and the first occurrence of a
    /// known field wins
    ///
    /// A body above `max_bytes` is reported as a decode error on the field
    /// being read when the limit was hit.
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_bytes: usize,
    ) -> Result<Self, ApiError> {
        let mut upload = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "upload", max_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let slot = match name.as_str() {
                IMAGE_FIELD => &mut upload.image,
                MASK_FIELD => &mut upload.mask,
                _ => {
                    debug!("Ignoring multipart field {:?}", name);
                    continue;
                }
            };

            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, &name, max_bytes))?;

            if slot.is_none() {
                *slot = Some(data);
            }
        }

        Ok(upload)
    }

    /// Validate the upload, returning `(image, mask)` bytes
    ///
    /// A field that is absent or empty counts as missing.
    pub fn into_files(self) -> Result<(Bytes, Bytes), ApiError> {
        let image = self.image.filter(|b| !b.is_empty());
        let mask = self.mask.filter(|b| !b.is_empty());

        match (image, mask) {
            (Some(image), Some(mask)) => Ok((image, mask)),
            (image, mask) => {
                let missing: Vec<&str> = [(IMAGE_FIELD, image.is_none()), (MASK_FIELD, mask.is_none())]
                    .into_iter()
                    .filter_map(|(field, absent)| absent.then_some(field))
                    .collect();
                Err(ApiError::ValidationError(format!(
                    "Missing image or mask file ({})",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Map a multipart failure without exposing parser text to the client
fn multipart_error(e: MultipartError, field: &str, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload of {} exceeded {} bytes: {}", field, max_bytes, e);
        ApiError::decode(field, ImageError::UploadTooLarge(max_bytes))
    } else {
        warn!("Malformed multipart body while reading {}: {}", field, e);
        ApiError::ValidationError(MALFORMED_FORM_MESSAGE.to_string())
    }
}
