//! Error types for block ingestion and the driving loop.

use thiserror::Error;

use densindex_core::TxOutRef;
use densindex_store::StoreError;
use densindex_sync::SyncError;

/// Errors that abort a block's transaction.
///
/// Nothing from the failed block is committed; the driving loop must not
/// advance past it.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The block's point is already indexed — duplicate delivery.
    #[error("duplicate point at slot {slot}")]
    DuplicatePoint { slot: u64 },

    /// A name-set entry arrived while no protocol row is live to supply
    /// the pointer minting policy.
    #[error("name-set entry at {tx_out_ref} requires a live protocol row")]
    MissingProtocol { tx_out_ref: TxOutRef },

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicatePoint { slot } => Self::DuplicatePoint { slot },
            other => Self::Store(other),
        }
    }
}

/// Anything that ends one driving-loop session.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("chain-sync: {0}")]
    Sync(#[from] SyncError),

    #[error("ingest: {0}")]
    Ingest(#[from] IngestError),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}
