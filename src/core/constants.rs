//! Constants used throughout the scoresheet pipeline.
//!
//! This module defines default values for the segmentation heuristics and
//! pipeline behavior. The selection thresholds are empirically tuned against
//! photographed tournament scoresheets; they are exposed as configuration
//! defaults so deployments can recalibrate without code changes.

/// The default grayscale threshold separating ink from paper.
///
/// Pixels with a gray value below this threshold are treated as ink.
pub const DEFAULT_INK_THRESHOLD: u8 = 128;

/// The default minimum side length (in pixels) a connected component must
/// reach before it is considered part of the notation table rather than noise.
pub const DEFAULT_NOISE_FLOOR_PX: u32 = 5;

/// The default minimum window used when smoothing a projection profile.
pub const DEFAULT_SMOOTHING_MIN_WINDOW: usize = 3;

/// The default divisor applied to a profile's length to derive its
/// smoothing window.
pub const DEFAULT_SMOOTHING_WINDOW_DIVISOR: usize = 100;

/// The default divisor applied to the table width to derive the column
/// profile's smoothing window.
pub const DEFAULT_COLUMN_SMOOTHING_DIVISOR: usize = 200;

/// The fraction of the profile maximum used as the edge onset threshold.
pub const DEFAULT_EDGE_ONSET_MAX_RATIO: f64 = 0.3;

/// The multiple of the profile average used as the edge onset threshold.
pub const DEFAULT_EDGE_ONSET_AVG_RATIO: f64 = 1.5;

/// The divisor used for the fallback edge position when no onset is found
/// in the scanned half of a profile.
pub const DEFAULT_EDGE_FALLBACK_DIVISOR: usize = 10;

/// The fraction of the profile average a valley's two-sided drop must exceed.
pub const DEFAULT_VALLEY_DROP_AVG_RATIO: f64 = 0.05;

/// The fraction of the profile average the summed derivative magnitude must
/// exceed at a zero crossing.
pub const DEFAULT_GRADIENT_MAGNITUDE_AVG_RATIO: f64 = 0.02;

/// The fraction of the profile average below which a windowed local minimum
/// qualifies as a boundary.
pub const DEFAULT_LOCAL_MINIMUM_AVG_RATIO: f64 = 0.8;

/// The divisor applied to the table width to derive the local-minimum
/// search radius.
pub const DEFAULT_LOCAL_MINIMUM_RADIUS_DIVISOR: usize = 100;

/// The minimum pixel gap below which adjacent detected boundaries collapse.
pub const DEFAULT_MIN_BOUNDARY_GAP: u32 = 3;

/// The divisor applied to the table width to derive the boundary merge gap.
pub const DEFAULT_BOUNDARY_GAP_DIVISOR: u32 = 100;

/// The maximum relative deviation from the median width before a column is
/// dropped as an outlier.
pub const DEFAULT_MEDIAN_DEVIATION_LIMIT: f64 = 0.5;

/// The maximum relative deviation from the expected per-column width before
/// a column is dropped as an outlier.
pub const DEFAULT_EXPECTED_DEVIATION_LIMIT: f64 = 0.8;

/// The multiple of the median width above which a leading column is dropped
/// as an annotation column.
pub const DEFAULT_LEADING_COLUMN_FACTOR: f64 = 1.4;

/// The minimum number of columns outlier filtering must leave behind for its
/// result to be used.
pub const DEFAULT_MIN_FILTERED_COLUMNS: usize = 3;

/// The maximum jump between original column indices tolerated inside one
/// candidate window.
pub const DEFAULT_MAX_INDEX_JUMP: usize = 3;

/// The maximum coefficient of variation of widths a candidate may have.
pub const DEFAULT_MAX_WIDTH_CV: f64 = 0.4;

/// The minimum min/max width ratio a candidate may have.
pub const DEFAULT_MIN_WIDTH_RATIO: f64 = 0.5;

/// The maximum (max - min) / mean width spread a candidate may have.
pub const DEFAULT_MAX_RANGE_RATIO: f64 = 1.0;

/// The minimum fraction of the table width a candidate must span.
pub const DEFAULT_MIN_COVERAGE: f64 = 0.7;

/// The bounds on a candidate's average width, as multiples of the table
/// width divided by the window size.
pub const DEFAULT_AVERAGE_WIDTH_BOUNDS: (f64, f64) = (0.4, 2.5);

/// The maximum relative deviation of any single column from the expected
/// per-column width inside an accepted candidate.
pub const DEFAULT_MAX_COLUMN_DEVIATION: f64 = 1.5;

/// The weights mixing CV, min/max ratio, and range spread into the
/// uniformity score.
pub const DEFAULT_UNIFORMITY_WEIGHTS: (f64, f64, f64) = (0.4, 0.4, 0.2);

/// The weights mixing uniformity, coverage, and centeredness into the final
/// candidate score.
pub const DEFAULT_SCORE_WEIGHTS: (f64, f64, f64) = (0.5, 0.4, 0.1);

/// The minimum score a short candidate must reach before missing trailing
/// columns are extrapolated instead of falling back to equal division.
pub const DEFAULT_EXTRAPOLATION_MIN_SCORE: f64 = 0.7;

/// The default number of move columns expected on a scoresheet page.
pub const DEFAULT_TARGET_COLUMNS: usize = 6;

/// The default minimum number of columns before extraction calls are fanned
/// out in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// The default language hint passed to the text extractor.
pub const DEFAULT_EXTRACTION_LANGUAGE: &str = "el";
