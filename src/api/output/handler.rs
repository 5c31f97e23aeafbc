// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Output retrieval handler

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::debug;

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// Every stored output is a PNG
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// GET /output/{filename} - Return the bytes of a generated image
///
/// Missing files and names that are not a single path component are 404.
pub async fn get_output_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.store.read(&filename).await?;
    debug!("Serving {} ({} bytes)", filename, bytes.len());

    Ok(([(header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE)], bytes))
}
