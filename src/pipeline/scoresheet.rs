//! The scoresheet processing pipeline.
//!
//! Orchestrates segmentation and transcript assembly over one photo:
//! locate the notation table, detect and select column boundaries, crop
//! the columns, fan extraction out over them, normalize the tokens, pair
//! the sides, render PGN, and collect legality verdicts. Segmentation
//! stages degrade through deterministic fallbacks instead of failing; the
//! only fatal conditions are an unreadable image and a photo in which no
//! strategy can find a table.

use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::{ExtractionMode, SegmentationConfig};
use super::result::{ScoresheetResult, SegmentationReport};
use crate::core::errors::ScanResult;
use crate::core::traits::{MoveValidation, MoveValidator, TextExtractor, ValidationStatus};
use crate::notation::{TokenNormalizer, TranscriptAssembler};
use crate::processors::{
    ColumnBoundaryDetector, ColumnSequenceSelector, Region, TableBoundaryLocator,
};
use crate::utils::{crop_region, load_image, to_gray};

/// Converts a scoresheet photo into a PGN transcript.
///
/// Generic over the text extraction and move validation collaborators;
/// the pipeline owns no recognition or chess logic of its own.
#[derive(Debug)]
pub struct ScoresheetPipeline<E, V> {
    config: SegmentationConfig,
    locator: TableBoundaryLocator,
    detector: ColumnBoundaryDetector,
    selector: ColumnSequenceSelector,
    normalizer: TokenNormalizer,
    assembler: TranscriptAssembler,
    extractor: E,
    validator: V,
}

impl<E, V> ScoresheetPipeline<E, V>
where
    E: TextExtractor,
    V: MoveValidator,
{
    /// Creates a pipeline from a validated configuration and the two
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::ConfigError` when the configuration is
    /// inconsistent.
    pub fn new(config: SegmentationConfig, extractor: E, validator: V) -> ScanResult<Self> {
        config.validate()?;
        Ok(Self {
            locator: TableBoundaryLocator::new(config.table.clone()),
            detector: ColumnBoundaryDetector::new(config.columns.clone()),
            selector: ColumnSequenceSelector::new(config.selection.clone()),
            normalizer: TokenNormalizer::greek(),
            assembler: TranscriptAssembler::new(config.tags.clone()),
            config,
            extractor,
            validator,
        })
    }

    /// Replaces the default Greek normalizer, e.g. for sheets written in
    /// another notation script.
    pub fn with_normalizer(mut self, normalizer: TokenNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Loads an image from disk and processes it.
    ///
    /// # Errors
    ///
    /// A missing or undecodable file is fatal and surfaces immediately as
    /// `ScanError::ImageLoad`.
    pub fn process_path(&self, path: &std::path::Path) -> ScanResult<ScoresheetResult> {
        let image = load_image(path)?;
        self.process_image(&image)
    }

    /// Processes a decoded photo into a best-effort transcript.
    ///
    /// # Errors
    ///
    /// `ScanError::TableNotFound` when every locating strategy comes back
    /// empty. Extraction failures are not errors; affected columns are
    /// simply absent from the transcript.
    pub fn process_image(&self, image: &RgbImage) -> ScanResult<ScoresheetResult> {
        let gray = to_gray(image);
        let located = self.locator.locate(&gray)?;
        let detected = self.detector.detect(&gray, &located.region);
        let selection =
            self.selector
                .select(&detected, &located.region, self.config.target_columns);

        let raw_columns = match self.config.extraction {
            ExtractionMode::PerColumn => {
                self.extract_per_column(image, &selection.boundaries, &located.region)
            }
            ExtractionMode::WholeSheet => self.extract_whole_sheet(image, &located.region),
        };
        let columns_total = raw_columns.len();
        let columns_read = raw_columns.iter().filter(|c| !c.is_empty()).count();

        let normalized: Vec<Vec<String>> = raw_columns
            .iter()
            .map(|column| self.normalizer.normalize_column(column))
            .collect();
        let (pairs, pgn) = self.assembler.assemble(&normalized);

        let moves: Vec<String> = pairs
            .iter()
            .flat_map(|pair| pair.white.iter().chain(pair.black.iter()).cloned())
            .collect();
        let validations = self.validate(&moves);

        Ok(ScoresheetResult {
            pgn,
            pairs,
            moves,
            validations,
            segmentation: SegmentationReport {
                table: located.region,
                strategy: located.strategy,
                detected_boundaries: detected.len(),
                selection_method: selection.method,
                selection_score: selection.score,
                columns_read,
                columns_total,
            },
        })
    }

    /// Crops every selected column and extracts each one independently.
    ///
    /// Columns are immutable slices of the source photo and carry no
    /// cross-column state, so above the configured threshold the calls fan
    /// out over a worker pool and are re-collected in column order. A
    /// failed column logs a warning and contributes an empty move list,
    /// keeping the even/odd side convention aligned for the rest.
    fn extract_per_column(
        &self,
        image: &RgbImage,
        boundaries: &[u32],
        table: &Region,
    ) -> Vec<Vec<String>> {
        let crops: Vec<Option<RgbImage>> = boundaries
            .windows(2)
            .filter(|pair| pair[1] > pair[0])
            .enumerate()
            .map(|(index, pair)| {
                let column = Region::new(pair[0], table.y, pair[1] - pair[0], table.height);
                match crop_region(image, &column) {
                    Ok(crop) => Some(crop),
                    Err(e) => {
                        warn!(
                            target: "pipeline",
                            column_index = index,
                            error = %e,
                            "Failed to crop column; skipping"
                        );
                        None
                    }
                }
            })
            .collect();

        let extract = |(index, crop): (usize, &Option<RgbImage>)| -> Vec<String> {
            let Some(crop) = crop else {
                return Vec::new();
            };
            match self.extractor.extract_text(crop, &self.config.language) {
                Ok(tokens) => {
                    debug!(
                        target: "pipeline",
                        column_index = index,
                        tokens = tokens.len(),
                        "Extracted column"
                    );
                    tokens
                }
                Err(e) => {
                    warn!(
                        target: "pipeline",
                        column_index = index,
                        error = %e,
                        "Extraction failed; column omitted from transcript"
                    );
                    Vec::new()
                }
            }
        };

        if crops.len() > self.config.parallel_threshold {
            crops.par_iter().enumerate().map(extract).collect()
        } else {
            crops.iter().enumerate().map(extract).collect()
        }
    }

    /// Extracts the whole table in one call and reorders the structured
    /// response into per-column arrays.
    fn extract_whole_sheet(&self, image: &RgbImage, table: &Region) -> Vec<Vec<String>> {
        let sheet = match crop_region(image, table) {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(target: "pipeline", error = %e, "Failed to crop table for extraction");
                return Vec::new();
            }
        };
        match self.extractor.extract_sheet(&sheet, &self.config.language) {
            Ok(response) => TranscriptAssembler::columns_from_response(&response),
            Err(e) => {
                warn!(
                    target: "pipeline",
                    error = %e,
                    "Whole-sheet extraction failed; transcript will be empty"
                );
                Vec::new()
            }
        }
    }

    /// Collects legality verdicts for the flattened move list.
    ///
    /// A failing validator degrades to an empty verdict list; the
    /// transcript itself is already assembled at this point.
    fn validate(&self, moves: &[String]) -> Vec<MoveValidation> {
        if moves.is_empty() {
            return Vec::new();
        }
        match self.validator.validate_moves(moves) {
            Ok(validations) => {
                for validation in &validations {
                    if validation.status != ValidationStatus::Ok {
                        warn!(
                            target: "pipeline",
                            move_index = validation.move_index,
                            status = ?validation.status,
                            message = validation.message.as_deref().unwrap_or(""),
                            "Validator flagged move"
                        );
                    }
                }
                validations
            }
            Err(e) => {
                warn!(target: "pipeline", error = %e, "Move validation failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ScanError;
    use crate::core::traits::{ColumnMoves, ColumnarMoves};
    use crate::processors::{LocateStrategy, SelectionMethod, TableLocatorConfig};
    use image::{Luma, Rgb};
    use std::sync::Mutex;

    /// A two-column sheet: handwriting-density arches left and right of a
    /// clean central gutter.
    fn two_column_sheet() -> RgbImage {
        let width = 400u32;
        let height = 200u32;
        let mut gray = image::GrayImage::from_pixel(width, height, Luma([255]));
        let band = (width / 2) as f64;
        for x in 0..width {
            let frac = (x as f64 % band) / band;
            let depth = (height as f64 * 0.7 * (std::f64::consts::PI * frac).sin()) as u32;
            for y in 0..depth {
                gray.put_pixel(x, y, Luma([40]));
            }
        }
        let mut rgb = RgbImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let v = pixel.0[0];
            rgb.put_pixel(x, y, Rgb([v, v, v]));
        }
        rgb
    }

    /// Replays scripted per-column token arrays in call order.
    struct ScriptedExtractor {
        responses: Mutex<Vec<ScanResult<Vec<String>>>>,
    }

    impl ScriptedExtractor {
        fn new(responses: Vec<ScanResult<Vec<String>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl TextExtractor for ScriptedExtractor {
        fn extract_text(&self, _column: &RgbImage, _language: &str) -> ScanResult<Vec<String>> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    /// Marks every move ok.
    #[derive(Debug)]
    struct AcceptAll;

    impl MoveValidator for AcceptAll {
        fn validate_moves(&self, moves: &[String]) -> ScanResult<Vec<MoveValidation>> {
            Ok(moves
                .iter()
                .enumerate()
                .map(|(move_index, _)| MoveValidation {
                    move_index,
                    status: ValidationStatus::Ok,
                    message: None,
                })
                .collect())
        }
    }

    fn two_column_config() -> SegmentationConfig {
        SegmentationConfig {
            target_columns: 2,
            ..SegmentationConfig::default()
        }
    }

    #[test]
    fn test_full_pipeline_produces_pgn() {
        let extractor = ScriptedExtractor::new(vec![
            Ok(vec!["ε4".to_string(), "Ιζ3".to_string()]),
            Ok(vec!["ε5".to_string(), "Ιγ6".to_string()]),
        ]);
        let pipeline = ScoresheetPipeline::new(two_column_config(), extractor, AcceptAll).unwrap();
        let result = pipeline.process_image(&two_column_sheet()).unwrap();

        assert!(result.pgn.contains("1. e4 e5"));
        assert!(result.pgn.contains("2. Nf3 Nc6"));
        assert!(result.pgn.ends_with(" *"));
        assert_eq!(result.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(result.validations.len(), 4);
        assert_eq!(result.segmentation.columns_total, 2);
        assert_eq!(result.segmentation.columns_read, 2);
        assert_eq!(result.segmentation.strategy, LocateStrategy::Morphology);
    }

    #[test]
    fn test_failed_column_is_omitted_not_fatal() {
        let extractor = ScriptedExtractor::new(vec![
            Ok(vec!["δ4".to_string()]),
            Err(ScanError::invalid_input("recognizer timeout")),
        ]);
        let pipeline = ScoresheetPipeline::new(two_column_config(), extractor, AcceptAll).unwrap();
        let result = pipeline.process_image(&two_column_sheet()).unwrap();

        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].white.as_deref(), Some("d4"));
        assert_eq!(result.pairs[0].black, None);
        assert_eq!(result.segmentation.columns_read, 1);
        assert!(result.pgn.contains("1. d4 *"));
    }

    #[test]
    fn test_blank_sheet_has_no_moves_but_succeeds() {
        let extractor = ScriptedExtractor::new(Vec::new());
        let pipeline = ScoresheetPipeline::new(two_column_config(), extractor, AcceptAll).unwrap();
        let blank = RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]));
        let result = pipeline.process_image(&blank).unwrap();

        assert!(result.moves.is_empty());
        assert!(result.validations.is_empty());
        assert_eq!(result.segmentation.strategy, LocateStrategy::ProfileScan);
        assert_eq!(
            result.segmentation.selection_method,
            SelectionMethod::EqualDivision
        );
        assert!(result.pgn.ends_with(" *"));
    }

    #[test]
    fn test_morphology_only_failure_is_fatal() {
        let extractor = ScriptedExtractor::new(Vec::new());
        let config = SegmentationConfig {
            target_columns: 2,
            table: TableLocatorConfig {
                strategies: vec![LocateStrategy::Morphology],
                ..TableLocatorConfig::default()
            },
            ..SegmentationConfig::default()
        };
        let pipeline = ScoresheetPipeline::new(config, extractor, AcceptAll).unwrap();
        let blank = RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]));
        let err = pipeline.process_image(&blank).unwrap_err();
        assert!(matches!(err, ScanError::TableNotFound { .. }));
    }

    #[derive(Debug)]
    struct WholeSheetExtractor;

    impl TextExtractor for WholeSheetExtractor {
        fn extract_text(&self, _column: &RgbImage, _language: &str) -> ScanResult<Vec<String>> {
            Err(ScanError::invalid_input("per-column mode unsupported"))
        }

        fn extract_sheet(&self, _sheet: &RgbImage, _language: &str) -> ScanResult<ColumnarMoves> {
            Ok(ColumnarMoves {
                columns: vec![
                    ColumnMoves {
                        column_index: 0,
                        moves: vec!["ε4".to_string()],
                    },
                    ColumnMoves {
                        column_index: 1,
                        moves: vec!["ε5".to_string()],
                    },
                ],
            })
        }
    }

    #[test]
    fn test_whole_sheet_mode() {
        let config = SegmentationConfig {
            target_columns: 2,
            extraction: ExtractionMode::WholeSheet,
            ..SegmentationConfig::default()
        };
        let pipeline = ScoresheetPipeline::new(config, WholeSheetExtractor, AcceptAll).unwrap();
        let result = pipeline.process_image(&two_column_sheet()).unwrap();
        assert!(result.pgn.contains("1. e4 e5 *"));
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let config = SegmentationConfig {
            target_columns: 3,
            ..SegmentationConfig::default()
        };
        let err = ScoresheetPipeline::new(config, WholeSheetExtractor, AcceptAll).unwrap_err();
        assert!(matches!(err, ScanError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_image_path_is_fatal() {
        let pipeline =
            ScoresheetPipeline::new(two_column_config(), WholeSheetExtractor, AcceptAll).unwrap();
        let err = pipeline
            .process_path(std::path::Path::new("/nonexistent/sheet.jpg"))
            .unwrap_err();
        assert!(matches!(err, ScanError::ImageLoad(_)));
    }
}
