//! The core module of the scoresheet pipeline.
//!
//! This module contains the fundamental components shared across the
//! pipeline:
//! - Constants backing the segmentation defaults
//! - Error handling
//! - Collaborator traits for text extraction and move validation
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod constants;
pub mod errors;
pub mod traits;

pub use constants::*;
pub use errors::{ProcessingStage, ScanError, ScanResult};
pub use traits::{
    ColumnMoves, ColumnarMoves, MoveValidation, MoveValidator, TextExtractor, ValidationStatus,
};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application
/// to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
