//! Locating the notation table inside a scoresheet photo.
//!
//! The locator runs an ordered list of strategies until one produces a
//! non-empty region. The morphology strategy bridges glyph gaps with a 3x3
//! dilation and takes the bounding box of the largest surviving connected
//! component; the profile strategy scans smoothed ink profiles inward from
//! each side of the photo. Only when every configured strategy comes back
//! empty does locating fail, and that failure is fatal for the request.

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::Region;
use super::projection;
use crate::core::constants::{
    DEFAULT_EDGE_FALLBACK_DIVISOR, DEFAULT_EDGE_ONSET_AVG_RATIO, DEFAULT_EDGE_ONSET_MAX_RATIO,
    DEFAULT_INK_THRESHOLD, DEFAULT_NOISE_FLOOR_PX,
};
use crate::core::errors::{ScanError, ScanResult};

/// A table-locating strategy, tried in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateStrategy {
    /// Dilation plus connected-component analysis.
    Morphology,
    /// Smoothed projection profiles scanned inward from each side.
    ProfileScan,
}

impl std::fmt::Display for LocateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateStrategy::Morphology => write!(f, "morphology"),
            LocateStrategy::ProfileScan => write!(f, "profile scan"),
        }
    }
}

/// Configuration for [`TableBoundaryLocator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLocatorConfig {
    /// Gray value below which a pixel counts as ink. Default: 128.
    #[serde(default = "default_ink_threshold")]
    pub ink_threshold: u8,
    /// Minimum bounding-box side (pixels) for a component to survive
    /// noise filtering. Default: 5.
    #[serde(default = "default_noise_floor")]
    pub noise_floor_px: u32,
    /// Strategies tried in order until one returns a non-empty region.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<LocateStrategy>,
}

fn default_ink_threshold() -> u8 {
    DEFAULT_INK_THRESHOLD
}

fn default_noise_floor() -> u32 {
    DEFAULT_NOISE_FLOOR_PX
}

fn default_strategies() -> Vec<LocateStrategy> {
    vec![LocateStrategy::Morphology, LocateStrategy::ProfileScan]
}

impl Default for TableLocatorConfig {
    fn default() -> Self {
        Self {
            ink_threshold: default_ink_threshold(),
            noise_floor_px: default_noise_floor(),
            strategies: default_strategies(),
        }
    }
}

/// A successfully located table together with the strategy that found it.
#[derive(Debug, Clone, Copy)]
pub struct LocatedTable {
    /// Bounding rectangle of the notation table within the photo.
    pub region: Region,
    /// The strategy that produced the region.
    pub strategy: LocateStrategy,
}

/// Finds the bounding rectangle of the handwritten table within a photo.
#[derive(Debug, Clone)]
pub struct TableBoundaryLocator {
    config: TableLocatorConfig,
}

/// Bounding box and population of one connected component.
#[derive(Debug, Clone, Copy)]
struct Component {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: u64,
}

impl TableBoundaryLocator {
    /// Creates a locator with the given configuration.
    pub fn new(config: TableLocatorConfig) -> Self {
        Self { config }
    }

    /// Runs the configured strategies in order and returns the first
    /// non-empty region.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::TableNotFound`] when every strategy comes back
    /// empty. With the default strategy list this only happens for images
    /// too small to carry a table at all.
    pub fn locate(&self, gray: &GrayImage) -> ScanResult<LocatedTable> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(ScanError::invalid_input("image has zero dimensions"));
        }
        for &strategy in &self.config.strategies {
            let found = match strategy {
                LocateStrategy::Morphology => self.locate_by_morphology(gray),
                LocateStrategy::ProfileScan => self.locate_by_profiles(gray),
            };
            if let Some(region) = found {
                if !region.is_empty() {
                    debug!(
                        target: "segmentation",
                        %strategy,
                        x = region.x,
                        y = region.y,
                        width = region.width,
                        height = region.height,
                        "Located notation table"
                    );
                    return Ok(LocatedTable { region, strategy });
                }
            }
            debug!(target: "segmentation", %strategy, "Strategy returned no region");
        }
        Err(ScanError::table_not_found(format!(
            "none of {} strategies produced a region",
            self.config.strategies.len()
        )))
    }

    /// Morphology path: binarize, dilate once with a 3x3 kernel, label
    /// 8-connected components, drop those under the noise floor, and take
    /// the bounding box of the largest survivor.
    fn locate_by_morphology(&self, gray: &GrayImage) -> Option<Region> {
        let threshold = self.config.ink_threshold;
        let mut binary = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let value = if pixel.0[0] < threshold { 255 } else { 0 };
            binary.put_pixel(x, y, Luma([value]));
        }

        let dilated = morphology::dilate(&binary, Norm::LInf, 1);
        let labels = connected_components(&dilated, Connectivity::Eight, Luma([0u8]));

        let mut components: HashMap<u32, Component> = HashMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let id = label.0[0];
            if id == 0 {
                continue;
            }
            components
                .entry(id)
                .and_modify(|c| {
                    c.min_x = c.min_x.min(x);
                    c.min_y = c.min_y.min(y);
                    c.max_x = c.max_x.max(x);
                    c.max_y = c.max_y.max(y);
                    c.pixels += 1;
                })
                .or_insert(Component {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                    pixels: 1,
                });
        }

        let floor = self.config.noise_floor_px;
        let largest = components
            .values()
            .filter(|c| c.max_x - c.min_x + 1 >= floor && c.max_y - c.min_y + 1 >= floor)
            .max_by_key(|c| c.pixels)?;

        Some(Region::new(
            largest.min_x,
            largest.min_y,
            largest.max_x - largest.min_x + 1,
            largest.max_y - largest.min_y + 1,
        ))
    }

    /// Profile path: smoothed horizontal and vertical ink profiles scanned
    /// inward from all four sides.
    ///
    /// Heuristic and non-fatal: degenerate edge positions fall back to the
    /// full image rather than reporting failure.
    fn locate_by_profiles(&self, gray: &GrayImage) -> Option<Region> {
        let full = Region::full(gray.width(), gray.height());
        let threshold = self.config.ink_threshold;
        let is_ink = |v: u8| v < threshold;

        let columns = projection::column_profile(gray, &full, is_ink);
        let columns = projection::smooth(&columns, projection::default_window(columns.len()));
        let rows = projection::row_profile(gray, &full, is_ink);
        let rows = projection::smooth(&rows, projection::default_window(rows.len()));

        let left = find_edge(&columns, true);
        let right = find_edge(&columns, false);
        let top = find_edge(&rows, true);
        let bottom = find_edge(&rows, false);

        if right <= left || bottom <= top {
            return Some(full);
        }
        Some(Region::new(
            left as u32,
            top as u32,
            (right - left + 1) as u32,
            (bottom - top + 1) as u32,
        ))
    }
}

/// Scans a smoothed profile inward from one end and returns the sample
/// index of the table edge.
///
/// Walks from the given end until the value first exceeds
/// `max(0.3 * max, 1.5 * avg)`, then backs off toward that end to the
/// nearest sample below half the threshold. When no onset appears within
/// the scanned half, the edge defaults to a tenth of the profile length
/// from that side.
fn find_edge(profile: &[f64], from_start: bool) -> usize {
    let len = profile.len();
    if len == 0 {
        return 0;
    }
    let onset = (DEFAULT_EDGE_ONSET_MAX_RATIO * projection::max(profile))
        .max(DEFAULT_EDGE_ONSET_AVG_RATIO * projection::mean(profile));
    let half = onset / 2.0;
    let fallback = len / DEFAULT_EDGE_FALLBACK_DIVISOR;

    if from_start {
        for i in 0..len / 2 {
            if profile[i] > onset {
                let mut edge = i;
                while edge > 0 && profile[edge] >= half {
                    edge -= 1;
                }
                return edge;
            }
        }
        fallback
    } else {
        let limit = len - len / 2;
        for i in (limit..len).rev() {
            if profile[i] > onset {
                let mut edge = i;
                while edge + 1 < len && profile[edge] >= half {
                    edge += 1;
                }
                return edge;
            }
        }
        len - 1 - fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    /// A white page with a solid dark block at the given region.
    fn page_with_block(width: u32, height: u32, block: Region) -> GrayImage {
        let mut img = white_image(width, height);
        for y in block.y..block.bottom() {
            for x in block.x..block.right() {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        img
    }

    #[test]
    fn test_morphology_finds_largest_block() {
        let block = Region::new(40, 30, 80, 60);
        let mut img = page_with_block(200, 150, block);
        // A smaller second blot elsewhere must lose to the table block.
        for y in 10..18 {
            for x in 160..170 {
                img.put_pixel(x, y, Luma([10]));
            }
        }
        let locator = TableBoundaryLocator::new(TableLocatorConfig::default());
        let found = locator.locate(&img).unwrap();
        assert_eq!(found.strategy, LocateStrategy::Morphology);
        // Dilation widens the component by one pixel per side.
        assert!(found.region.x >= block.x - 1 && found.region.x <= block.x);
        assert!(found.region.right() >= block.right() && found.region.right() <= block.right() + 1);
        assert!(found.region.width >= block.width);
    }

    #[test]
    fn test_noise_below_floor_is_discarded() {
        let mut img = white_image(100, 100);
        // Isolated specks; dilation grows a lone pixel to 3x3, still under
        // the 5x5 floor.
        for &(x, y) in &[(10u32, 10u32), (50, 50), (90, 20)] {
            img.put_pixel(x, y, Luma([0]));
        }
        let locator = TableBoundaryLocator::new(TableLocatorConfig {
            strategies: vec![LocateStrategy::Morphology],
            ..TableLocatorConfig::default()
        });
        let err = locator.locate(&img).unwrap_err();
        assert!(matches!(err, ScanError::TableNotFound { .. }));
    }

    #[test]
    fn test_profile_fallback_on_blank_page() {
        let img = white_image(120, 100);
        let locator = TableBoundaryLocator::new(TableLocatorConfig::default());
        let found = locator.locate(&img).unwrap();
        assert_eq!(found.strategy, LocateStrategy::ProfileScan);
        assert!(!found.region.is_empty());
        assert!(found.region.right() <= 120);
        assert!(found.region.bottom() <= 100);
    }

    #[test]
    fn test_profile_scan_tracks_ink_extent() {
        let block = Region::new(30, 20, 60, 50);
        let img = page_with_block(120, 100, block);
        let locator = TableBoundaryLocator::new(TableLocatorConfig {
            strategies: vec![LocateStrategy::ProfileScan],
            ..TableLocatorConfig::default()
        });
        let found = locator.locate(&img).unwrap();
        // Smoothing blurs the edges; the located region must still overlap
        // the block generously.
        assert!(found.region.x <= block.x + 5);
        assert!(found.region.right() + 5 >= block.right());
    }

    #[test]
    fn test_all_black_page_locates_everything() {
        let img = GrayImage::from_pixel(80, 80, Luma([0]));
        let locator = TableBoundaryLocator::new(TableLocatorConfig::default());
        let found = locator.locate(&img).unwrap();
        assert_eq!(found.strategy, LocateStrategy::Morphology);
        assert_eq!(found.region, Region::full(80, 80));
    }

    #[test]
    fn test_find_edge_defaults_without_onset() {
        let flat = vec![0.0; 100];
        assert_eq!(find_edge(&flat, true), 10);
        assert_eq!(find_edge(&flat, false), 89);
    }

    #[test]
    fn test_find_edge_walks_back_to_half_threshold() {
        // Narrow peak in the first half: the onset crossing lands inside the
        // peak, the edge walks back to the last sample under half threshold.
        let mut profile = vec![0.0; 40];
        for v in profile.iter_mut().take(22).skip(18) {
            *v = 20.0;
        }
        assert_eq!(find_edge(&profile, true), 17);
    }
}
