// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting API endpoint module
//!
//! Provides POST /inpaint for mask-guided image regeneration.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::inpaint_handler;
pub use request::InpaintUpload;
pub use response::InpaintResponse;
