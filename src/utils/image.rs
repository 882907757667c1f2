//! Utility functions for image loading and cropping.

use image::{DynamicImage, GrayImage, RgbImage, imageops};

use crate::core::errors::{ScanError, ScanResult};
use crate::processors::Region;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts an RgbImage to a GrayImage.
pub fn to_gray(img: &RgbImage) -> GrayImage {
    DynamicImage::ImageRgb8(img.clone()).to_luma8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `ScanError::ImageLoad` if the image cannot be read or decoded;
/// this is the only fatal input error of the pipeline.
pub fn load_image(path: &std::path::Path) -> ScanResult<RgbImage> {
    let img = image::open(path).map_err(ScanError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Crops a region out of an image into a fresh buffer.
///
/// The region is clamped to the image first; analysis never mutates the
/// source image in place.
///
/// # Errors
///
/// Returns `ScanError::InvalidInput` when the clamped region is empty.
pub fn crop_region(img: &RgbImage, region: &Region) -> ScanResult<RgbImage> {
    let clamped = region.clamped_to(img.width(), img.height());
    if clamped.is_empty() {
        return Err(ScanError::invalid_input(format!(
            "region {}x{}+{}+{} lies outside the {}x{} image",
            region.width,
            region.height,
            region.x,
            region.y,
            img.width(),
            img.height()
        )));
    }
    Ok(imageops::crop_imm(img, clamped.x, clamped.y, clamped.width, clamped.height).to_image())
}
