//! Selecting the run of detected columns that holds the moves.
//!
//! Boundary detection over-generates: margin scribbles, move-number
//! columns, and ruling artifacts all produce boundaries. This stage turns
//! the boundary list into per-column width statistics, discards outliers,
//! enumerates candidate runs of consecutive columns, scores them for
//! move-column plausibility, and either returns the best run (extrapolating
//! missing trailing columns when the run is short but convincing) or falls
//! back to dividing the table into equal parts. Selection never fails; it
//! always produces exactly `target + 1` boundaries.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::Region;
use crate::core::constants::{
    DEFAULT_AVERAGE_WIDTH_BOUNDS, DEFAULT_EXPECTED_DEVIATION_LIMIT,
    DEFAULT_EXTRAPOLATION_MIN_SCORE, DEFAULT_LEADING_COLUMN_FACTOR, DEFAULT_MAX_COLUMN_DEVIATION,
    DEFAULT_MAX_INDEX_JUMP, DEFAULT_MAX_RANGE_RATIO, DEFAULT_MAX_WIDTH_CV,
    DEFAULT_MEDIAN_DEVIATION_LIMIT, DEFAULT_MIN_COVERAGE, DEFAULT_MIN_FILTERED_COLUMNS,
    DEFAULT_MIN_WIDTH_RATIO, DEFAULT_SCORE_WEIGHTS, DEFAULT_UNIFORMITY_WEIGHTS,
};

/// One detected column between two adjacent boundaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Position in the original left-to-right boundary order.
    pub index: usize,
    /// Left edge, image-absolute.
    pub start_x: u32,
    /// Right edge (exclusive), image-absolute.
    pub end_x: u32,
}

impl ColumnInfo {
    /// Width of the column in pixels.
    pub fn width(&self) -> u32 {
        self.end_x - self.start_x
    }

    /// Width as a fraction of the table width.
    pub fn relative_width(&self, region_width: u32) -> f64 {
        self.width() as f64 / region_width as f64
    }
}

/// How the final boundary list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// A full-size candidate run of detected columns won.
    Detected,
    /// A short but high-scoring run won and trailing columns were
    /// synthesized at its average width.
    Extrapolated,
    /// No candidate survived; the table was divided into equal parts.
    EqualDivision,
}

/// The selected column partition.
#[derive(Debug, Clone)]
pub struct ColumnSelection {
    /// Exactly `target + 1` strictly increasing, image-absolute boundaries.
    pub boundaries: Vec<u32>,
    /// How the boundaries were produced.
    pub method: SelectionMethod,
    /// Score of the winning candidate, absent for equal division.
    pub score: Option<f64>,
}

/// A candidate run of consecutive columns with its derived metrics.
///
/// Constructed, scored, and either selected or discarded within a single
/// selection call; never persisted.
#[derive(Debug, Clone)]
struct ColumnSequence {
    columns: Vec<ColumnInfo>,
    average_width: f64,
    uniformity: f64,
    coverage: f64,
    centeredness: f64,
    score: f64,
}

/// Configuration for [`ColumnSequenceSelector`].
///
/// The thresholds are empirically tuned against photographed scoresheets;
/// they are carried as configuration so deployments can recalibrate them
/// without a contract change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSelectorConfig {
    /// Maximum relative deviation from the median width before a column is
    /// dropped as an outlier. Default: 0.5.
    #[serde(default = "default_median_deviation")]
    pub median_deviation_limit: f64,
    /// Maximum relative deviation from the expected per-column width before
    /// a column is dropped as an outlier. Default: 0.8.
    #[serde(default = "default_expected_deviation")]
    pub expected_deviation_limit: f64,
    /// Multiple of the median width above which the leading column is
    /// dropped as an annotation column. Default: 1.4.
    #[serde(default = "default_leading_factor")]
    pub leading_column_factor: f64,
    /// Minimum columns outlier filtering must leave for its result to be
    /// used; otherwise the unfiltered list is kept. Default: 3.
    #[serde(default = "default_min_filtered")]
    pub min_filtered_columns: usize,
    /// Maximum jump between original indices inside one window. Default: 3.
    #[serde(default = "default_max_jump")]
    pub max_index_jump: usize,
    /// Maximum coefficient of variation of widths. Default: 0.4.
    #[serde(default = "default_max_cv")]
    pub max_width_cv: f64,
    /// Minimum min/max width ratio. Default: 0.5.
    #[serde(default = "default_min_width_ratio")]
    pub min_width_ratio: f64,
    /// Maximum (max - min) / mean width spread. Default: 1.0.
    #[serde(default = "default_max_range_ratio")]
    pub max_range_ratio: f64,
    /// Minimum fraction of the table width a candidate must span.
    /// Default: 0.7.
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
    /// Bounds on average width as multiples of tableWidth / windowSize.
    /// Default: (0.4, 2.5).
    #[serde(default = "default_average_width_bounds")]
    pub average_width_bounds: (f64, f64),
    /// Maximum relative deviation of any single column from the expected
    /// per-column width. Default: 1.5.
    #[serde(default = "default_max_column_deviation")]
    pub max_column_deviation: f64,
    /// Weights mixing (1 - CV), min/max ratio, and range spread into the
    /// uniformity score. Default: (0.4, 0.4, 0.2).
    #[serde(default = "default_uniformity_weights")]
    pub uniformity_weights: (f64, f64, f64),
    /// Weights mixing uniformity, coverage, and centeredness into the
    /// final score. Default: (0.5, 0.4, 0.1).
    #[serde(default = "default_score_weights")]
    pub score_weights: (f64, f64, f64),
    /// Minimum score a short candidate needs before extrapolation is
    /// attempted. Default: 0.7.
    #[serde(default = "default_extrapolation_min_score")]
    pub extrapolation_min_score: f64,
}

fn default_median_deviation() -> f64 {
    DEFAULT_MEDIAN_DEVIATION_LIMIT
}

fn default_expected_deviation() -> f64 {
    DEFAULT_EXPECTED_DEVIATION_LIMIT
}

fn default_leading_factor() -> f64 {
    DEFAULT_LEADING_COLUMN_FACTOR
}

fn default_min_filtered() -> usize {
    DEFAULT_MIN_FILTERED_COLUMNS
}

fn default_max_jump() -> usize {
    DEFAULT_MAX_INDEX_JUMP
}

fn default_max_cv() -> f64 {
    DEFAULT_MAX_WIDTH_CV
}

fn default_min_width_ratio() -> f64 {
    DEFAULT_MIN_WIDTH_RATIO
}

fn default_max_range_ratio() -> f64 {
    DEFAULT_MAX_RANGE_RATIO
}

fn default_min_coverage() -> f64 {
    DEFAULT_MIN_COVERAGE
}

fn default_average_width_bounds() -> (f64, f64) {
    DEFAULT_AVERAGE_WIDTH_BOUNDS
}

fn default_max_column_deviation() -> f64 {
    DEFAULT_MAX_COLUMN_DEVIATION
}

fn default_uniformity_weights() -> (f64, f64, f64) {
    DEFAULT_UNIFORMITY_WEIGHTS
}

fn default_score_weights() -> (f64, f64, f64) {
    DEFAULT_SCORE_WEIGHTS
}

fn default_extrapolation_min_score() -> f64 {
    DEFAULT_EXTRAPOLATION_MIN_SCORE
}

impl Default for SequenceSelectorConfig {
    fn default() -> Self {
        Self {
            median_deviation_limit: default_median_deviation(),
            expected_deviation_limit: default_expected_deviation(),
            leading_column_factor: default_leading_factor(),
            min_filtered_columns: default_min_filtered(),
            max_index_jump: default_max_jump(),
            max_width_cv: default_max_cv(),
            min_width_ratio: default_min_width_ratio(),
            max_range_ratio: default_max_range_ratio(),
            min_coverage: default_min_coverage(),
            average_width_bounds: default_average_width_bounds(),
            max_column_deviation: default_max_column_deviation(),
            uniformity_weights: default_uniformity_weights(),
            score_weights: default_score_weights(),
            extrapolation_min_score: default_extrapolation_min_score(),
        }
    }
}

/// Picks the best run of `target` move columns out of a boundary list.
#[derive(Debug, Clone)]
pub struct ColumnSequenceSelector {
    config: SequenceSelectorConfig,
}

impl ColumnSequenceSelector {
    /// Creates a selector with the given configuration.
    pub fn new(config: SequenceSelectorConfig) -> Self {
        Self { config }
    }

    /// Selects `target` columns from the detected boundaries.
    ///
    /// Infallible: when no candidate run survives scoring, the table is
    /// divided into `target` equal parts. The result always holds exactly
    /// `target + 1` strictly increasing boundaries unless the region is
    /// narrower than `target` pixels, in which case equal division may
    /// repeat positions.
    pub fn select(&self, boundaries: &[u32], region: &Region, target: usize) -> ColumnSelection {
        if target == 0 {
            return ColumnSelection {
                boundaries: vec![region.x, region.right()],
                method: SelectionMethod::EqualDivision,
                score: None,
            };
        }
        if boundaries.len() < 4 {
            debug!(
                target: "segmentation",
                count = boundaries.len(),
                "Too few boundaries for selection, dividing equally"
            );
            return self.equal_division(region, target);
        }

        let columns: Vec<ColumnInfo> = boundaries
            .windows(2)
            .filter(|pair| pair[1] > pair[0])
            .enumerate()
            .map(|(index, pair)| ColumnInfo {
                index,
                start_x: pair[0],
                end_x: pair[1],
            })
            .collect();

        let expected_column = region.width as f64 / target as f64;
        let filtered = self.filter_outliers(&columns, expected_column);
        let pool = if filtered.len() >= self.config.min_filtered_columns {
            filtered
        } else {
            debug!(
                target: "segmentation",
                survivors = filtered.len(),
                "Outlier filtering too aggressive, keeping all columns"
            );
            columns
        };

        let window_size = target.min(pool.len());
        if window_size == 0 {
            return self.equal_division(region, target);
        }

        let mut best: Option<ColumnSequence> = None;
        for window in pool.windows(window_size) {
            if !self.indices_contiguous(window) {
                continue;
            }
            let Some(candidate) = self.score_candidate(window, region, expected_column) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    candidate.score > current.score
                        || (candidate.score == current.score
                            && candidate.uniformity > current.uniformity)
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        if let Some(winner) = &best {
            debug!(
                target: "segmentation",
                columns = winner.columns.len(),
                average_width = winner.average_width,
                uniformity = winner.uniformity,
                coverage = winner.coverage,
                centeredness = winner.centeredness,
                score = winner.score,
                "Best candidate run"
            );
        }

        match best {
            Some(winner) if winner.columns.len() == target => {
                let score = winner.score;
                ColumnSelection {
                    boundaries: sequence_boundaries(&winner.columns),
                    method: SelectionMethod::Detected,
                    score: Some(score),
                }
            }
            Some(winner) if winner.score > self.config.extrapolation_min_score => {
                match self.extrapolate(&winner, region, target) {
                    Some(boundaries) => ColumnSelection {
                        boundaries,
                        method: SelectionMethod::Extrapolated,
                        score: Some(winner.score),
                    },
                    None => {
                        warn!(
                            target: "segmentation",
                            "Extrapolation ran out of table width, dividing equally"
                        );
                        self.equal_division(region, target)
                    }
                }
            }
            _ => {
                debug!(target: "segmentation", "No candidate run survived, dividing equally");
                self.equal_division(region, target)
            }
        }
    }

    /// Divides the region into `target` equal parts.
    ///
    /// `boundary[i] = region.x + i * width / target` with integer division;
    /// deterministic, non-decreasing, first at the left edge and last at
    /// the right edge.
    pub fn equal_division(&self, region: &Region, target: usize) -> ColumnSelection {
        let boundaries = (0..=target)
            .map(|i| region.x + ((i as u64 * region.width as u64) / target as u64) as u32)
            .collect();
        ColumnSelection {
            boundaries,
            method: SelectionMethod::EqualDivision,
            score: None,
        }
    }

    /// Drops columns whose width deviates too far from the median or the
    /// expected per-column width, and a leading column wide enough to be an
    /// annotation or move-number gutter.
    fn filter_outliers(&self, columns: &[ColumnInfo], expected: f64) -> Vec<ColumnInfo> {
        let widths: Vec<f64> = columns.iter().map(|c| c.width() as f64).collect();
        let median = median(&widths);
        if median <= 0.0 || expected <= 0.0 {
            return columns.to_vec();
        }
        columns
            .iter()
            .filter(|c| {
                let w = c.width() as f64;
                if (w - median).abs() / median > self.config.median_deviation_limit {
                    return false;
                }
                if (w - expected).abs() / expected > self.config.expected_deviation_limit {
                    return false;
                }
                if c.index == 0 && w > self.config.leading_column_factor * median {
                    return false;
                }
                true
            })
            .copied()
            .collect()
    }

    /// True when original indices inside the window never jump by more
    /// than the configured limit (tolerating a few filtered-out columns).
    fn indices_contiguous(&self, window: &[ColumnInfo]) -> bool {
        window
            .windows(2)
            .all(|pair| pair[1].index - pair[0].index <= self.config.max_index_jump)
    }

    /// Applies the hard rejection gates and computes the candidate metrics.
    ///
    /// Returns `None` when any gate fires.
    fn score_candidate(
        &self,
        window: &[ColumnInfo],
        region: &Region,
        expected_column: f64,
    ) -> Option<ColumnSequence> {
        let widths: Vec<f64> = window.iter().map(|c| c.width() as f64).collect();
        let count = widths.len() as f64;
        let mean = widths.iter().sum::<f64>() / count;
        if mean <= 0.0 {
            return None;
        }
        let variance = widths.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / count;
        let cv = variance.sqrt() / mean;
        let min = widths.iter().copied().fold(f64::INFINITY, f64::min);
        let max = widths.iter().copied().fold(0.0, f64::max);
        let min_max_ratio = min / max;
        let range_ratio = (max - min) / mean;
        let span = (window.last()?.end_x - window.first()?.start_x) as f64;
        let coverage = span / region.width as f64;
        let expected_window = region.width as f64 / count;
        let (lower, upper) = self.config.average_width_bounds;

        if cv > self.config.max_width_cv
            || min_max_ratio < self.config.min_width_ratio
            || range_ratio > self.config.max_range_ratio
            || coverage < self.config.min_coverage
            || mean < lower * expected_window
            || mean > upper * expected_window
            || widths
                .iter()
                .any(|w| (w - expected_column).abs() / expected_column
                    > self.config.max_column_deviation)
        {
            return None;
        }

        let (wu_cv, wu_ratio, wu_range) = self.config.uniformity_weights;
        let uniformity =
            wu_cv * (1.0 - cv) + wu_ratio * min_max_ratio + wu_range * (1.0 - range_ratio / 2.0);
        let coverage_score = if coverage >= 0.8 {
            1.0
        } else {
            (0.5 + 5.0 * (coverage - self.config.min_coverage)).clamp(0.0, 1.0)
        };
        let midpoint = (window.first()?.start_x + window.last()?.end_x) as f64 / 2.0;
        let centeredness =
            (1.0 - (midpoint - region.mid_x()).abs() / (region.width as f64 / 2.0)).clamp(0.0, 1.0);
        let (ws_uniformity, ws_coverage, ws_center) = self.config.score_weights;
        let score =
            ws_uniformity * uniformity + ws_coverage * coverage_score + ws_center * centeredness;

        Some(ColumnSequence {
            columns: window.to_vec(),
            average_width: mean,
            uniformity,
            coverage,
            centeredness,
            score,
        })
    }

    /// Appends synthetic trailing columns of the candidate's average width,
    /// clamped to the table's right edge.
    ///
    /// Returns `None` when clamping would break strict monotonicity; the
    /// caller then divides equally instead.
    fn extrapolate(
        &self,
        winner: &ColumnSequence,
        region: &Region,
        target: usize,
    ) -> Option<Vec<u32>> {
        let mut boundaries = sequence_boundaries(&winner.columns);
        let step = winner.average_width.round().max(1.0) as u32;
        for _ in winner.columns.len()..target {
            let last = *boundaries.last()?;
            boundaries.push((last + step).min(region.right()));
        }
        if boundaries.windows(2).all(|pair| pair[0] < pair[1]) {
            Some(boundaries)
        } else {
            None
        }
    }
}

/// Column starts plus the final column end.
fn sequence_boundaries(columns: &[ColumnInfo]) -> Vec<u32> {
    let mut boundaries: Vec<u32> = columns.iter().map(|c| c.start_x).collect();
    if let Some(last) = columns.last() {
        boundaries.push(last.end_x);
    }
    boundaries
}

/// Median of a slice; zero for an empty slice.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted: Vec<f64> = values.iter().copied().sorted_by(|a, b| a.total_cmp(b)).collect();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> ColumnSequenceSelector {
        ColumnSequenceSelector::new(SequenceSelectorConfig::default())
    }

    fn info(index: usize, start_x: u32, end_x: u32) -> ColumnInfo {
        ColumnInfo {
            index,
            start_x,
            end_x,
        }
    }

    #[test]
    fn test_equal_division_is_deterministic() {
        let region = Region::new(40, 0, 1000, 500);
        let selection = selector().equal_division(&region, 6);
        assert_eq!(selection.boundaries.len(), 7);
        assert_eq!(selection.boundaries[0], 40);
        assert_eq!(*selection.boundaries.last().unwrap(), 1040);
        for (i, b) in selection.boundaries.iter().enumerate() {
            assert_eq!(*b, 40 + (i as u32 * 1000) / 6);
        }
        assert!(selection.boundaries.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_too_few_boundaries_divides_equally() {
        let region = Region::new(0, 0, 600, 400);
        let selection = selector().select(&[0, 300, 600], &region, 4);
        assert_eq!(selection.method, SelectionMethod::EqualDivision);
        assert_eq!(selection.boundaries, vec![0, 150, 300, 450, 600]);
    }

    #[test]
    fn test_wide_leading_annotation_column_is_excluded() {
        // A 400px comment column followed by six 200px move columns.
        let boundaries = [0, 400, 600, 800, 1000, 1200, 1400, 1600];
        let region = Region::new(0, 0, 1600, 900);
        let selection = selector().select(&boundaries, &region, 6);
        assert_eq!(selection.method, SelectionMethod::Detected);
        assert_eq!(selection.boundaries.len(), 7);
        // The winning run starts after the comment column.
        assert_eq!(selection.boundaries[0], 400);
        assert_eq!(*selection.boundaries.last().unwrap(), 1600);
        assert!(selection.score.unwrap() > 0.5);
    }

    #[test]
    fn test_wild_width_window_is_gated_out() {
        // Widths [50, 50, 50, 500, 50, 50]: the CV gate alone kills it.
        let window = [
            info(0, 0, 50),
            info(1, 50, 100),
            info(2, 100, 150),
            info(3, 150, 650),
            info(4, 650, 700),
            info(5, 700, 750),
        ];
        let region = Region::new(0, 0, 750, 400);
        let candidate = selector().score_candidate(&window, &region, 125.0);
        assert!(candidate.is_none());
    }

    #[test]
    fn test_low_coverage_window_is_gated_out() {
        // Uniform but spanning half the table.
        let window = [info(0, 0, 100), info(1, 100, 200), info(2, 200, 300)];
        let region = Region::new(0, 0, 900, 400);
        let candidate = selector().score_candidate(&window, &region, 300.0);
        assert!(candidate.is_none());
    }

    #[test]
    fn test_uniform_full_run_is_selected() {
        let boundaries = [0, 150, 300, 450, 600];
        let region = Region::new(0, 0, 600, 400);
        let selection = selector().select(&boundaries, &region, 4);
        assert_eq!(selection.method, SelectionMethod::Detected);
        assert_eq!(selection.boundaries, vec![0, 150, 300, 450, 600]);
        let score = selection.score.unwrap();
        assert!(score > 0.9, "uniform centered run should score high: {score}");
    }

    #[test]
    fn test_short_strong_candidate_is_extrapolated() {
        // Four clean 100px columns detected out of a six-column table; the
        // right third of the sheet was too faint to segment.
        let boundaries = [0, 100, 200, 300, 400];
        let region = Region::new(0, 0, 620, 400);
        let config = SequenceSelectorConfig {
            // Four columns over 620px fails the default coverage gate;
            // relax it to model the faint-right-edge case.
            min_coverage: 0.6,
            ..SequenceSelectorConfig::default()
        };
        let selection = ColumnSequenceSelector::new(config).select(&boundaries, &region, 6);
        assert_eq!(selection.method, SelectionMethod::Extrapolated);
        assert_eq!(selection.boundaries, vec![0, 100, 200, 300, 400, 500, 600]);
    }

    #[test]
    fn test_selection_always_returns_target_plus_one() {
        let region = Region::new(10, 10, 977, 400);
        for target in [2usize, 4, 6] {
            let selection = selector().select(&[10, 13, 987], &region, target);
            assert_eq!(selection.boundaries.len(), target + 1);
            assert_eq!(selection.boundaries[0], 10);
            assert_eq!(*selection.boundaries.last().unwrap(), 987);
        }
    }

    #[test]
    fn test_gated_candidates_fall_back_to_equal_division() {
        // Three narrow columns and one huge one: the survivors of outlier
        // filtering span too little of the table, so every candidate is
        // gated out and equal division wins.
        let boundaries = [0, 100, 200, 300, 2000];
        let region = Region::new(0, 0, 2000, 400);
        let selection = selector().select(&boundaries, &region, 4);
        assert_eq!(selection.boundaries.len(), 5);
        assert!(selection.boundaries.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_column_info_widths() {
        let column = info(2, 150, 250);
        assert_eq!(column.width(), 100);
        assert_eq!(column.relative_width(1000), 0.1);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }
}
