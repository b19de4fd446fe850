//! Error types for the chain-sync session.

use thiserror::Error;

/// Errors raised by the chain-sync session.
///
/// Transport errors are retried by the caller (reconnect, re-run
/// intersection). `Desync` is fatal to the session: an unexpected message
/// shape means the protocol state no longer matches the peer's, and the
/// only safe recovery is a fresh session.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("protocol desynchronisation: {0}")]
    Desync(String),

    #[error("no intersection established; find_intersection must succeed first")]
    NotStreaming,
}

impl SyncError {
    pub(crate) fn transport(e: impl std::fmt::Display) -> Self {
        Self::Transport(e.to_string())
    }

    pub(crate) fn desync(e: impl std::fmt::Display) -> Self {
        Self::Desync(e.to_string())
    }

    /// Returns `true` if the session must be rebuilt rather than retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Desync(_))
    }
}
