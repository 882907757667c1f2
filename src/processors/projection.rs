//! Projection profiles over binarized image regions.
//!
//! A projection profile is a 1-D signal obtained by summing a binary ink
//! indicator along one image axis. Both the table locator and the column
//! detector build their evidence from these profiles, with different
//! binarization thresholds and smoothing windows passed in by the caller.
//!
//! All functions here are pure: profiles are produced fresh per call and
//! smoothing returns a new sequence of equal length.

use image::GrayImage;

use super::geometry::Region;
use crate::core::constants::{DEFAULT_SMOOTHING_MIN_WINDOW, DEFAULT_SMOOTHING_WINDOW_DIVISOR};

/// Builds a per-column ink-density profile over a region.
///
/// For every x position inside the region, sums the binarization rule over
/// the column of pixels, producing a profile of length `region.width`.
///
/// # Arguments
///
/// * `gray` - Grayscale source image.
/// * `region` - Region to scan; callers must pass a region already clamped
///   to the image.
/// * `is_ink` - Binarization rule mapping a gray value to ink (true) or
///   background (false).
pub fn column_profile<F>(gray: &GrayImage, region: &Region, is_ink: F) -> Vec<f64>
where
    F: Fn(u8) -> bool,
{
    let mut profile = vec![0.0; region.width as usize];
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            if is_ink(gray.get_pixel(x, y).0[0]) {
                profile[(x - region.x) as usize] += 1.0;
            }
        }
    }
    profile
}

/// Builds a per-row ink-density profile over a region.
///
/// The row-axis counterpart of [`column_profile`]; the result has length
/// `region.height`.
pub fn row_profile<F>(gray: &GrayImage, region: &Region, is_ink: F) -> Vec<f64>
where
    F: Fn(u8) -> bool,
{
    let mut profile = vec![0.0; region.height as usize];
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            if is_ink(gray.get_pixel(x, y).0[0]) {
                profile[(y - region.y) as usize] += 1.0;
            }
        }
    }
    profile
}

/// The default smoothing window for a profile of the given length.
pub fn default_window(len: usize) -> usize {
    (len / DEFAULT_SMOOTHING_WINDOW_DIVISOR).max(DEFAULT_SMOOTHING_MIN_WINDOW)
}

/// Smooths a profile with a centered mean window.
///
/// Each sample is replaced by the mean of a window of `window` samples
/// centered on it; at the array edges the window is clamped and becomes
/// asymmetric. Returns a new profile of equal length.
pub fn smooth(profile: &[f64], window: usize) -> Vec<f64> {
    if profile.is_empty() || window <= 1 {
        return profile.to_vec();
    }
    let half = window / 2;
    let len = profile.len();
    let mut smoothed = Vec::with_capacity(len);
    for i in 0..len {
        let start = i.saturating_sub(half);
        let end = (i + half).min(len - 1);
        let sum: f64 = profile[start..=end].iter().sum();
        smoothed.push(sum / (end - start + 1) as f64);
    }
    smoothed
}

/// Mean of a profile, zero for an empty profile.
pub fn mean(profile: &[f64]) -> f64 {
    if profile.is_empty() {
        return 0.0;
    }
    profile.iter().sum::<f64>() / profile.len() as f64
}

/// Maximum of a profile, zero for an empty profile.
pub fn max(profile: &[f64]) -> f64 {
    profile.iter().copied().fold(0.0, f64::max)
}
