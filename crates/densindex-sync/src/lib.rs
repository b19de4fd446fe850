//! densindex-sync — the chain-sync mini-protocol client.
//!
//! A minimal subset of the node's chain-sync protocol over one persistent
//! WebSocket: intersection negotiation plus pipelined block fetch. The
//! session does not interpret block payloads beyond converting the wire
//! JSON into the core block model; applying them is the ingestor's job.

pub mod error;
pub mod session;
pub mod wire;

pub use error::SyncError;
pub use session::{BlockEvent, ChainSyncSession, SessionState, PIPELINE_DEPTH};
