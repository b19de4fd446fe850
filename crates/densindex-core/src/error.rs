//! Error types for domain-type parsing and conversion.

use thiserror::Error;

/// Errors raised when converting raw bytes or text into typed values.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid length: expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    BadHex(#[from] hex::FromHexError),

    #[error("invalid asset class: {0}")]
    BadAssetClass(String),
}
