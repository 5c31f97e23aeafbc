// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the inpaint node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-sd2-inpainting-2025-10-15";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-15";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "multipart-inpaint",
    "mask-inversion",
    "fixed-working-size",
    "diffusion-sidecar",
    "device-autodetect",
    "bounded-generation",
    "png-output-store",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Inpaint Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
