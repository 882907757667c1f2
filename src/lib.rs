//! # Scoresheet OCR
//!
//! A Rust library that turns a photograph of a handwritten chess
//! scoresheet into a PGN transcript. The library owns the geometric
//! segmentation (finding the notation table, partitioning it into move
//! columns) and the notation work (transliterating recognized tokens,
//! pairing the sides, rendering PGN); character recognition and
//! chess-legality checking are delegated to collaborators behind narrow
//! traits.
//!
//! ## Pipeline
//!
//! 1. **Table location**: morphological dilation plus connected-component
//!    analysis finds the handwriting block; a projection-profile scan
//!    backs it up on low-contrast photos.
//! 2. **Column detection**: three boundary heuristics (valleys, gradient
//!    zero crossings, windowed minima) run over a smoothed ink profile
//!    and their union is deduplicated.
//! 3. **Column selection**: candidate runs of columns are scored for
//!    width uniformity, table coverage, and centeredness; the best run
//!    wins, short-but-convincing runs are extrapolated, and equal
//!    division is the last resort. Selection never fails.
//! 4. **Extraction**: each column is cropped and handed to the
//!    [`TextExtractor`] collaborator; failed columns are skipped, not
//!    fatal.
//! 5. **Assembly**: tokens are transliterated to Latin algebraic
//!    notation, the sides are paired, and PGN is rendered; verdicts from
//!    the [`MoveValidator`] collaborator are attached.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scoresheet_ocr::prelude::*;
//! use std::path::Path;
//!
//! # struct MyOcr;
//! # impl TextExtractor for MyOcr {
//! #     fn extract_text(&self, _: &image::RgbImage, _: &str) -> ScanResult<Vec<String>> {
//! #         Ok(vec![])
//! #     }
//! # }
//! # struct MyValidator;
//! # impl MoveValidator for MyValidator {
//! #     fn validate_moves(&self, _: &[String]) -> ScanResult<Vec<MoveValidation>> {
//! #         Ok(vec![])
//! #     }
//! # }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SegmentationConfig {
//!     target_columns: 4,
//!     ..SegmentationConfig::default()
//! };
//! let pipeline = ScoresheetPipeline::new(config, MyOcr, MyValidator)?;
//! let result = pipeline.process_path(Path::new("scoresheet.jpg"))?;
//! println!("{}", result.pgn);
//! # Ok(())
//! # }
//! ```
//!
//! [`TextExtractor`]: crate::core::traits::TextExtractor
//! [`MoveValidator`]: crate::core::traits::MoveValidator

pub mod core;
pub mod notation;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use scoresheet_ocr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ColumnarMoves, MoveValidation, MoveValidator, ScanError, ScanResult, TextExtractor,
        ValidationStatus,
    };
    pub use crate::notation::{GameTags, MovePair, TokenNormalizer, TranscriptAssembler};
    pub use crate::pipeline::{
        ExtractionMode, ScoresheetPipeline, ScoresheetResult, SegmentationConfig,
        SegmentationReport,
    };
    pub use crate::processors::Region;
    pub use crate::utils::load_image;
}
