//! Column boundary detection inside the located table.
//!
//! Three independent heuristics run over one smoothed ink profile and their
//! outputs are unioned before deduplication: valley detection, gradient
//! zero crossings, and windowed local minima. Each heuristic is cheap and
//! misses real boundaries on its own; together they over-generate, and the
//! downstream sequence selector is responsible for keeping only runs that
//! look like move columns.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use image::GrayImage;

use super::geometry::Region;
use super::projection;
use crate::core::constants::{
    DEFAULT_BOUNDARY_GAP_DIVISOR, DEFAULT_COLUMN_SMOOTHING_DIVISOR,
    DEFAULT_GRADIENT_MAGNITUDE_AVG_RATIO, DEFAULT_INK_THRESHOLD, DEFAULT_LOCAL_MINIMUM_AVG_RATIO,
    DEFAULT_LOCAL_MINIMUM_RADIUS_DIVISOR, DEFAULT_MIN_BOUNDARY_GAP, DEFAULT_VALLEY_DROP_AVG_RATIO,
};

/// Configuration for [`ColumnBoundaryDetector`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDetectorConfig {
    /// Gray value below which a pixel counts as ink. Default: 128.
    #[serde(default = "default_ink_threshold")]
    pub ink_threshold: u8,
    /// Fraction of the profile average a valley's two-sided drop must
    /// exceed. Default: 0.05.
    #[serde(default = "default_valley_drop")]
    pub valley_drop_ratio: f64,
    /// Fraction of the profile average the summed derivative magnitude must
    /// exceed at a zero crossing. Default: 0.02.
    #[serde(default = "default_gradient_magnitude")]
    pub gradient_magnitude_ratio: f64,
    /// Fraction of the profile average below which a windowed local minimum
    /// qualifies. Default: 0.8.
    #[serde(default = "default_local_minimum")]
    pub local_minimum_ratio: f64,
}

fn default_ink_threshold() -> u8 {
    DEFAULT_INK_THRESHOLD
}

fn default_valley_drop() -> f64 {
    DEFAULT_VALLEY_DROP_AVG_RATIO
}

fn default_gradient_magnitude() -> f64 {
    DEFAULT_GRADIENT_MAGNITUDE_AVG_RATIO
}

fn default_local_minimum() -> f64 {
    DEFAULT_LOCAL_MINIMUM_AVG_RATIO
}

impl Default for ColumnDetectorConfig {
    fn default() -> Self {
        Self {
            ink_threshold: default_ink_threshold(),
            valley_drop_ratio: default_valley_drop(),
            gradient_magnitude_ratio: default_gradient_magnitude(),
            local_minimum_ratio: default_local_minimum(),
        }
    }
}

/// Detects candidate column boundaries within the table region.
#[derive(Debug, Clone)]
pub struct ColumnBoundaryDetector {
    config: ColumnDetectorConfig,
}

impl ColumnBoundaryDetector {
    /// Creates a detector with the given configuration.
    pub fn new(config: ColumnDetectorConfig) -> Self {
        Self { config }
    }

    /// Detects column boundaries inside `region`.
    ///
    /// The result is strictly increasing, starts at `region.x`, ends at
    /// `region.right()`, and is expressed in image-absolute coordinates.
    pub fn detect(&self, gray: &GrayImage, region: &Region) -> Vec<u32> {
        let width = region.width as usize;
        if width < 2 {
            return vec![region.x, region.right()];
        }

        let threshold = self.config.ink_threshold;
        let profile = projection::column_profile(gray, region, |v| v < threshold);
        let window = (width / DEFAULT_COLUMN_SMOOTHING_DIVISOR).max(2);
        let profile = projection::smooth(&profile, window);
        let avg = projection::mean(&profile);

        let mut boundaries: Vec<usize> = Vec::new();
        boundaries.extend(self.find_valleys(&profile, avg));
        boundaries.extend(self.find_zero_crossings(&profile, avg));
        boundaries.extend(self.find_local_minima(&profile, avg));
        boundaries.push(0);
        boundaries.push(width);

        let merged = merge_boundaries(boundaries, width);
        debug!(
            target: "segmentation",
            count = merged.len(),
            table_width = width,
            "Detected column boundaries"
        );
        merged
            .into_iter()
            .map(|b| region.x + b as u32)
            .collect()
    }

    /// Valley detection: a position strictly lower than both neighbors
    /// whose two-sided drop exceeds `max(1, ratio * avg)`.
    fn find_valleys(&self, profile: &[f64], avg: f64) -> Vec<usize> {
        let gate = (self.config.valley_drop_ratio * avg).max(1.0);
        let mut found = Vec::new();
        for x in 1..profile.len().saturating_sub(1) {
            let here = profile[x];
            if here < profile[x - 1] && here < profile[x + 1] {
                let drop = (profile[x - 1] - here) + (profile[x + 1] - here);
                if drop > gate {
                    found.push(x);
                }
            }
        }
        found
    }

    /// Gradient zero crossings: the discrete derivative turns from negative
    /// to positive with enough combined magnitude.
    fn find_zero_crossings(&self, profile: &[f64], avg: f64) -> Vec<usize> {
        let gate = self.config.gradient_magnitude_ratio * avg;
        let derivative: Vec<f64> = profile.windows(2).map(|w| w[1] - w[0]).collect();
        let mut found = Vec::new();
        for i in 1..derivative.len() {
            if derivative[i - 1] < 0.0
                && derivative[i] > 0.0
                && derivative[i - 1].abs() + derivative[i].abs() > gate
            {
                found.push(i);
            }
        }
        found
    }

    /// Windowed local minima: strictly below every other sample in a radius
    /// of about a hundredth of the table width, and below `ratio * avg`.
    fn find_local_minima(&self, profile: &[f64], avg: f64) -> Vec<usize> {
        let radius = (profile.len() / DEFAULT_LOCAL_MINIMUM_RADIUS_DIVISOR).max(1);
        let ceiling = self.config.local_minimum_ratio * avg;
        let mut found = Vec::new();
        for x in 0..profile.len() {
            if profile[x] >= ceiling {
                continue;
            }
            let start = x.saturating_sub(radius);
            let end = (x + radius).min(profile.len() - 1);
            let is_minimum = (start..=end)
                .filter(|&j| j != x)
                .all(|j| profile[x] < profile[j]);
            if is_minimum {
                found.push(x);
            }
        }
        found
    }
}

/// Sorts, deduplicates, and merges boundaries that sit closer together
/// than `max(3, width / 100)`, keeping the first of each cluster and
/// always keeping the final region edge.
fn merge_boundaries(boundaries: Vec<usize>, width: usize) -> Vec<usize> {
    let min_gap =
        ((width as u32 / DEFAULT_BOUNDARY_GAP_DIVISOR).max(DEFAULT_MIN_BOUNDARY_GAP)) as usize;
    let sorted: Vec<usize> = boundaries
        .into_iter()
        .sorted()
        .dedup()
        .collect();

    let mut merged: Vec<usize> = Vec::with_capacity(sorted.len());
    for b in sorted {
        match merged.last() {
            Some(&last) if b - last < min_gap => {}
            _ => merged.push(b),
        }
    }
    // The trailing region edge survives merging unconditionally.
    if merged.last() != Some(&width) {
        if let Some(&last) = merged.last() {
            if last + min_gap > width && last != 0 {
                merged.pop();
            }
        }
        merged.push(width);
    }
    merged
}
