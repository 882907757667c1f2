//! Result types returned by the scoresheet pipeline.

use serde::{Deserialize, Serialize};

use crate::core::traits::MoveValidation;
use crate::notation::MovePair;
use crate::processors::{LocateStrategy, Region, SelectionMethod};

/// Quantified record of how the sheet was segmented.
///
/// Surfaces the fallback decisions taken along the way so callers can
/// judge how much to trust the transcript: an equal-division partition of
/// a profile-scanned table reads very differently from a high-scoring
/// detected run inside a morphology-located one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationReport {
    /// Bounding rectangle of the located table.
    pub table: Region,
    /// The strategy that located the table.
    pub strategy: LocateStrategy,
    /// Number of raw boundaries the detector produced.
    pub detected_boundaries: usize,
    /// How the final column partition was chosen.
    pub selection_method: SelectionMethod,
    /// Score of the winning candidate, absent for equal division.
    pub selection_score: Option<f64>,
    /// Columns whose extraction succeeded.
    pub columns_read: usize,
    /// Total columns submitted for extraction.
    pub columns_total: usize,
}

/// Best-effort transcript of one scoresheet photo.
#[derive(Debug, Clone)]
pub struct ScoresheetResult {
    /// Rendered PGN document.
    pub pgn: String,
    /// Numbered move pairs; absent sides are `None`.
    pub pairs: Vec<MovePair>,
    /// Moves flattened into play order, as handed to the validator.
    pub moves: Vec<String>,
    /// Per-move verdicts from the legality validator; empty when the
    /// validator itself failed.
    pub validations: Vec<MoveValidation>,
    /// How the sheet was segmented.
    pub segmentation: SegmentationReport,
}
