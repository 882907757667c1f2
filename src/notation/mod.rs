//! Move token normalization and transcript assembly.

mod assembler;
mod normalizer;

pub use assembler::{GameTags, MovePair, TranscriptAssembler};
pub use normalizer::TokenNormalizer;
