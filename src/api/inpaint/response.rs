// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting response types

use serde::{Deserialize, Serialize};

/// Response from POST /inpaint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InpaintResponse {
    /// Always "success"
    pub status: String,
    /// Name to fetch the result with via GET /output/{filename}
    pub filename: String,
}

impl InpaintResponse {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            filename: filename.into(),
        }
    }
}
