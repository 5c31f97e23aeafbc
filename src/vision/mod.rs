// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image handling for the inpainting path
//!
//! - `image_utils`: decode uploads, encode PNG/base64 payloads
//! - `preprocess`: RGB/grayscale conversion, fixed-size resize, mask inversion

pub mod image_utils;
pub mod preprocess;

pub use image_utils::{
    decode_base64_image, decode_image_bytes, decode_image_bytes_with_limit, detect_format,
    encode_gray_base64, encode_gray_png, encode_rgb_base64, encode_rgb_png, ImageError, ImageInfo,
    MAX_IMAGE_SIZE,
};
pub use preprocess::{invert_mask, prepare_image, prepare_inputs, prepare_mask, PreparedInputs};
