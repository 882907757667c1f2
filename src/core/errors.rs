//! Error types for the scoresheet pipeline.
//!
//! This module defines the error types that can occur while segmenting a
//! scoresheet photo and assembling its transcript, along with utility
//! functions for creating these errors with appropriate context.

use thiserror::Error;

/// Enum representing different stages of processing in the scoresheet pipeline.
///
/// This enum is used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred while locating the notation table.
    TableLocation,
    /// Error occurred during column boundary detection.
    ColumnDetection,
    /// Error occurred while cropping a column image.
    Cropping,
    /// Error occurred during text extraction.
    Extraction,
    /// Error occurred during token normalization or assembly.
    Transcription,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TableLocation => write!(f, "table location"),
            ProcessingStage::ColumnDetection => write!(f, "column detection"),
            ProcessingStage::Cropping => write!(f, "cropping"),
            ProcessingStage::Extraction => write!(f, "extraction"),
            ProcessingStage::Transcription => write!(f, "transcription"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing various errors that can occur in the scoresheet pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// No notation table could be located in the photo.
    ///
    /// Raised only after every configured locating strategy has returned an
    /// empty region; callers should surface this to the user rather than
    /// retry with the same image.
    #[error("table not found: {message}")]
    TableNotFound {
        /// A message describing which strategies were exhausted.
        message: String,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from decoding a structured extraction response.
    #[error("response decode")]
    ResponseDecode(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for scoresheet operations.
pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// Creates a ScanError for a failed processing operation.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage of processing where the error occurred.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    ///
    /// # Returns
    ///
    /// A ScanError instance.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ScanError for a failed extraction call.
    pub fn extraction_error(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::Extraction,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ScanError for invalid input.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a ScanError for configuration errors.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a ScanError for an exhausted table-locating strategy chain.
    pub fn table_not_found(message: impl Into<String>) -> Self {
        Self::TableNotFound {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ScanError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(
            format!("{}", ProcessingStage::TableLocation),
            "table location"
        );
        assert_eq!(format!("{}", ProcessingStage::Generic), "processing");
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::invalid_input("empty image");
        assert_eq!(format!("{}", err), "invalid input: empty image");

        let err = ScanError::table_not_found("all strategies exhausted");
        assert!(format!("{}", err).contains("table not found"));
    }

    #[test]
    fn test_processing_error_chains_source() {
        let inner = std::io::Error::other("boom");
        let err = ScanError::processing_error(ProcessingStage::Extraction, "column 3", inner);
        assert!(format!("{}", err).contains("extraction failed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
