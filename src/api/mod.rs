// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod inpaint;
pub mod output;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, serve, start_server, AppState, HealthResponse};
pub use inpaint::{inpaint_handler, InpaintResponse, InpaintUpload};
pub use output::{get_output_handler, OUTPUT_CONTENT_TYPE};
