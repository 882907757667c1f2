//! Collaborator traits for the scoresheet pipeline.
//!
//! The pipeline delegates character recognition and chess-legality checking
//! to external services behind these two narrow seams. The crate never
//! implements either concern itself; it only crops, normalizes, and
//! assembles around them.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::errors::{ScanError, ScanResult};

/// Moves recognized for a single physical column of the sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMoves {
    /// Zero-based index of the column, left to right.
    pub column_index: usize,
    /// Raw move tokens read top to bottom.
    pub moves: Vec<String>,
}

/// Structured response from a whole-sheet extraction call.
///
/// Produced when the extractor reads the entire table in one request and
/// returns moves already keyed by column index, instead of the pipeline
/// issuing one call per cropped column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnarMoves {
    /// Per-column move arrays; order is not guaranteed, consumers sort by
    /// `column_index`.
    pub columns: Vec<ColumnMoves>,
}

/// Text extraction collaborator.
///
/// Implementations may wrap a vision LLM, a classic OCR engine, or a test
/// double; the pipeline only requires raw token arrays in reading order.
pub trait TextExtractor: Send + Sync {
    /// Extracts raw move tokens from a single cropped column image.
    ///
    /// # Arguments
    ///
    /// * `column` - The cropped column image.
    /// * `language` - Language hint for the recognizer (e.g. "el").
    ///
    /// # Returns
    ///
    /// Raw tokens top to bottom, or an error for this column only; the
    /// pipeline skips failed columns without aborting the sheet.
    fn extract_text(&self, column: &RgbImage, language: &str) -> ScanResult<Vec<String>>;

    /// Extracts the whole sheet in one call, returning moves keyed by column.
    ///
    /// The default implementation reports the mode as unsupported so that
    /// per-column extractors do not have to stub it out.
    fn extract_sheet(&self, sheet: &RgbImage, language: &str) -> ScanResult<ColumnarMoves> {
        let _ = (sheet, language);
        Err(ScanError::invalid_input(
            "extractor does not support whole-sheet extraction",
        ))
    }
}

/// Per-move verdict severity reported by the legality validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The move is legal in context.
    Ok,
    /// The move is suspicious but playable (e.g. ambiguous disambiguation).
    Warning,
    /// The move is illegal or unreadable in context.
    Error,
}

/// Verdict for a single move in play order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveValidation {
    /// Zero-based index into the flattened move list.
    pub move_index: usize,
    /// Severity of the verdict.
    pub status: ValidationStatus,
    /// Optional human-readable explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Chess-legality validation collaborator.
///
/// Consumed after assembly; the pipeline logs and propagates the verdicts
/// but never implements chess rules itself.
pub trait MoveValidator: Send + Sync {
    /// Validates a flattened move list in play order.
    fn validate_moves(&self, moves: &[String]) -> ScanResult<Vec<MoveValidation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columnar_moves_json_shape() {
        let json = r#"{"columns":[{"columnIndex":1,"moves":["e5","Nc6"]}]}"#;
        let parsed: ColumnarMoves = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.columns.len(), 1);
        assert_eq!(parsed.columns[0].column_index, 1);
        assert_eq!(parsed.columns[0].moves, vec!["e5", "Nc6"]);
    }

    #[test]
    fn test_validation_status_serializes_lowercase() {
        let v = MoveValidation {
            move_index: 0,
            status: ValidationStatus::Warning,
            message: None,
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(!json.contains("message"));
    }

    struct Unsupported;

    impl TextExtractor for Unsupported {
        fn extract_text(&self, _column: &RgbImage, _language: &str) -> ScanResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_whole_sheet_default_is_unsupported() {
        let sheet = RgbImage::new(4, 4);
        let err = Unsupported.extract_sheet(&sheet, "el").unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput { .. }));
    }
}
