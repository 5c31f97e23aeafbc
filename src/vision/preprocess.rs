// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inpainting input preparation
//!
//! Both rasters are forced to a square working size (aspect ratio is not
//! preserved) and the mask is inverted so that black marks the region the
//! pipeline regenerates.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};

/// Bicubic resampling
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Image and mask ready for the generation call
#[derive(Debug, Clone)]
pub struct PreparedInputs {
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl PreparedInputs {
    /// Dimensions shared by the image and the mask
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Convert to RGB and resize to `size`x`size`
pub fn prepare_image(image: &DynamicImage, size: u32) -> RgbImage {
    let rgb = image.to_rgb8();
    if rgb.dimensions() == (size, size) {
        return rgb;
    }
    imageops::resize(&rgb, size, size, RESIZE_FILTER)
}

/// Convert to grayscale, resize to `size`x`size` and invert
pub fn prepare_mask(mask: &DynamicImage, size: u32) -> GrayImage {
    let gray = mask.to_luma8();
    let mut resized = if gray.dimensions() == (size, size) {
        gray
    } else {
        imageops::resize(&gray, size, size, RESIZE_FILTER)
    };
    invert_mask(&mut resized);
    resized
}

/// Replace every mask value `v` with `255 - v`
pub fn invert_mask(mask: &mut GrayImage) {
    imageops::invert(mask);
}

pub fn prepare_inputs(image: &DynamicImage, mask: &DynamicImage, size: u32) -> PreparedInputs {
    PreparedInputs {
        image: prepare_image(image, size),
        mask: prepare_mask(mask, size),
    }
}
