//! Error types for the registry store.

use thiserror::Error;

/// Errors that can occur reading or writing the registry.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A point at this slot is already indexed; duplicate block delivery.
    #[error("point at slot {slot} already indexed")]
    DuplicatePoint { slot: u64 },

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub(crate) fn db(e: impl std::fmt::Display) -> Self {
        Self::Database(e.to_string())
    }
}
