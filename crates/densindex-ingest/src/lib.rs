//! densindex-ingest — applies the chain's block stream to the registry.
//!
//! # Phase 1: INTERSECT
//! Seed `findIntersection` with the store's most recent points (origin as
//! the final fallback). The upstream replays from the agreed point.
//!
//! # Phase 2: STREAM
//! One committed store transaction per event, strictly sequential:
//!   - `RollForward(block)`: re-check the tracked protocol NFT, derive the
//!     block's UTxO delta, classify and apply every inline datum.
//!   - `RollBackward(point)`: discard every point after the target.
//!
//! Session or ingest errors never advance past the failed block: the loop
//! reconnects with backoff and re-runs intersection from the committed tip.

pub mod config;
pub mod driver;
pub mod error;
pub mod ingestor;

pub use config::IndexerConfig;
pub use driver::Indexer;
pub use error::{DriverError, IngestError};
pub use ingestor::BlockIngestor;
