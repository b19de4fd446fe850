//! Error types for the codec layers.

use thiserror::Error;

/// Why a byte string failed to decode into a [`crate::PlutusData`] tree.
///
/// `Malformed` means structurally invalid bytes; `Unsupported` means valid
/// CBOR using a construct the datum model does not include. Both are
/// per-datum and recoverable: the ingestor logs and skips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed datum: {0}")]
    Malformed(String),

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// A tree did not match the record shape a typed decoder expected.
///
/// This is the normal outcome of probing a datum against the wrong shape;
/// it is a non-match, not an error to report.
#[derive(Debug, Clone, Error)]
#[error("not a {expected}: {reason}")]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub reason: String,
}

impl TypeMismatch {
    pub(crate) fn new(expected: &'static str, reason: impl Into<String>) -> Self {
        Self {
            expected,
            reason: reason.into(),
        }
    }
}
