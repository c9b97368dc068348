//! # Error Types
//!
//! Encoding errors for shared chain entities.

use thiserror::Error;

/// Errors raised while encoding or decoding chain entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Entity could not be serialized.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Bytes did not decode into the expected entity.
    #[error("Decoding failed: {0}")]
    Decoding(String),
}
