//! densindex-store — the rollback-capable registry projection.
//!
//! Persists the chain-position set, live output references, the protocol
//! singleton, the sorted name set, and per-name record bundles to a single
//! SQLite file. Uses `sqlx` with WAL mode so external readers (the name
//! lookup adapter, the HTTP query service) run concurrently with ingestion
//! and never observe a partially-applied block.
//!
//! Writes go through [`RegistrySession`], one transaction per block or
//! rollback: everything inside commits atomically or not at all (dropping
//! a session without committing rolls it back).
//!
//! # Usage
//! ```rust,no_run
//! use densindex_store::RegistryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = RegistryStore::open("./dens.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = RegistryStore::in_memory().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod queries;
pub mod session;
pub mod store;

pub use error::StoreError;
pub use session::RegistrySession;
pub use store::{PredecessorLookup, RegistryStore};
