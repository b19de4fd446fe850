//! densindex-core — shared domain types for the DensIndex pipeline.
//!
//! # Architecture
//!
//! ```text
//! ChainSyncSession → BlockIngestor → RegistryStore
//!        │                │               │
//!        └── Block ───────┤               │
//!                         └── Point / TxOutRef / AssetClass
//!                             NameSetEntry / ProtocolRecord / ResourceRecord
//! ```
//!
//! Every other crate in the workspace depends on these types; this crate
//! depends on nothing but the serialization stack.

pub mod asset;
pub mod block;
pub mod error;
pub mod point;
pub mod record;

pub use asset::{AssetClass, ScriptHash};
pub use block::{Assets, Block, Transaction, TxOut, TxOutRef};
pub use error::TypeError;
pub use point::{ChainPoint, Hash32, Point};
pub use record::{
    derive_pointer, NameSetEntry, NameSetNode, NodeKey, ProtocolParams, ProtocolRecord,
    ResourceRecord,
};
