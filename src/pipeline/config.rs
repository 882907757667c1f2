//! Configuration types for the scoresheet pipeline.

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    DEFAULT_EXTRACTION_LANGUAGE, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TARGET_COLUMNS,
};
use crate::core::errors::{ScanError, ScanResult};
use crate::notation::GameTags;
use crate::processors::{ColumnDetectorConfig, SequenceSelectorConfig, TableLocatorConfig};

/// How move text is extracted from the segmented sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// One extraction call per cropped column image.
    #[default]
    PerColumn,
    /// A single call over the whole table, returning moves keyed by
    /// column index.
    WholeSheet,
}

/// Aggregate configuration for [`ScoresheetPipeline`].
///
/// [`ScoresheetPipeline`]: crate::pipeline::ScoresheetPipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Table locating configuration.
    #[serde(default)]
    pub table: TableLocatorConfig,
    /// Column boundary detection configuration.
    #[serde(default)]
    pub columns: ColumnDetectorConfig,
    /// Candidate selection configuration.
    #[serde(default)]
    pub selection: SequenceSelectorConfig,
    /// Number of move columns on the sheet; always even, since columns
    /// alternate White and Black. Default: 6.
    #[serde(default = "default_target_columns")]
    pub target_columns: usize,
    /// Language hint forwarded to the extractor. Default: "el".
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-column or whole-sheet extraction.
    #[serde(default)]
    pub extraction: ExtractionMode,
    /// Minimum column count before extraction calls fan out in parallel.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    /// PGN header tags.
    #[serde(default)]
    pub tags: GameTags,
}

fn default_target_columns() -> usize {
    DEFAULT_TARGET_COLUMNS
}

fn default_language() -> String {
    DEFAULT_EXTRACTION_LANGUAGE.to_string()
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            table: TableLocatorConfig::default(),
            columns: ColumnDetectorConfig::default(),
            selection: SequenceSelectorConfig::default(),
            target_columns: default_target_columns(),
            language: default_language(),
            extraction: ExtractionMode::default(),
            parallel_threshold: default_parallel_threshold(),
            tags: GameTags::default(),
        }
    }
}

impl SegmentationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ConfigError` for a zero or odd column target,
    /// an empty strategy list, or score weights that no longer mix to one.
    pub fn validate(&self) -> ScanResult<()> {
        if self.target_columns == 0 {
            return Err(ScanError::config_error("target_columns must be positive"));
        }
        if self.target_columns % 2 != 0 {
            return Err(ScanError::config_error(format!(
                "target_columns must be even (columns alternate sides), got {}",
                self.target_columns
            )));
        }
        if self.table.strategies.is_empty() {
            return Err(ScanError::config_error(
                "at least one table locating strategy is required",
            ));
        }
        let (a, b, c) = self.selection.uniformity_weights;
        if (a + b + c - 1.0).abs() > 1e-6 {
            return Err(ScanError::config_error(
                "uniformity_weights must sum to 1.0",
            ));
        }
        let (a, b, c) = self.selection.score_weights;
        if (a + b + c - 1.0).abs() > 1e-6 {
            return Err(ScanError::config_error("score_weights must sum to 1.0"));
        }
        let (lower, upper) = self.selection.average_width_bounds;
        if lower <= 0.0 || upper <= lower {
            return Err(ScanError::config_error(
                "average_width_bounds must satisfy 0 < lower < upper",
            ));
        }
        if !(0.0..=1.0).contains(&self.selection.min_coverage) {
            return Err(ScanError::config_error(
                "min_coverage must lie within [0, 1]",
            ));
        }
        Ok(())
    }
}
