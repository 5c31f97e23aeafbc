// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::diffusion::GenerationError;
use crate::storage::StorageError;
use crate::vision::ImageError;

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed client input
    ValidationError(String),
    /// An uploaded file could not be decoded
    DecodeError { field: String, source: ImageError },
    /// The pipeline failed to produce an image
    GenerationError(GenerationError),
    /// The pipeline cannot be reached
    ServiceUnavailable(String),
    /// Encoding or disk failure while persisting or reading output
    StorageError(StorageError),
    NotFound(String),
    InternalError(String),
}

impl ApiError {
    pub fn decode(field: &str, source: ImageError) -> Self {
        ApiError::DecodeError {
            field: field.to_string(),
            source,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "validation_error",
            ApiError::DecodeError { .. } => "decode_error",
            ApiError::GenerationError(_) => "generation_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::StorageError(_) => "storage_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::DecodeError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::GenerationError(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::StorageError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message; upstream and I/O detail stays in the logs
    pub fn client_message(&self) -> String {
        match self {
            ApiError::ValidationError(msg) => msg.clone(),
            ApiError::DecodeError { field, source } => {
                format!("Failed to decode {}: {}", field, source)
            }
            ApiError::GenerationError(_) => "Image generation failed".to_string(),
            ApiError::ServiceUnavailable(_) => "Inpainting service not available".to_string(),
            ApiError::StorageError(_) => "Failed to store generated image".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::InternalError(_) => "Internal server error".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.client_message(),
            error_type: self.error_type().to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::DecodeError { field, source } => {
                write!(f, "Decode error for {}: {}", field, source)
            }
            ApiError::GenerationError(e) => write!(f, "Generation error: {}", e),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::StorageError(e) => write!(f, "Storage error: {}", e),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::GenerationError(other),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) | StorageError::InvalidFilename(name) => {
                ApiError::NotFound(format!("Output file '{}' not found", name))
            }
            other => ApiError::StorageError(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Json(self.to_response())).into_response()
    }
}
