//! The chain-sync session state machine.
//!
//! One long-lived duplex connection drives three states:
//!
//! ```text
//! Connected → IntersectionRequested → Streaming
//! ```
//!
//! `find_intersection` negotiates the resume point; once streaming, the
//! session keeps up to [`PIPELINE_DEPTH`] `nextBlock` requests outstanding
//! so the next response is usually already in flight while the previous
//! block is being applied. Closing the connection at any state is safe:
//! the session holds no state the store cannot rebuild.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use densindex_core::{Block, ChainPoint};

use crate::error::SyncError;
use crate::wire::{
    parse_intersection, with_origin_fallback, IntersectionOutcome, NextBlockResult, Request,
    Response,
};

/// Outstanding `nextBlock` requests kept in flight while streaming.
///
/// Two is enough to hide one round-trip behind block application; the
/// transport buffers anything the ingestor has not consumed yet.
pub const PIPELINE_DEPTH: usize = 2;

/// Where the session is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket open, no intersection negotiated.
    Connected,
    /// An intersection request is outstanding.
    IntersectionRequested,
    /// Intersection confirmed; blocks are being streamed.
    Streaming,
}

/// One step of the stream: the chain advanced or rolled back.
#[derive(Debug, Clone)]
pub enum BlockEvent {
    RollForward(Block),
    RollBackward(ChainPoint),
}

/// A chain-sync protocol session over one WebSocket connection.
pub struct ChainSyncSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    state: SessionState,
    next_id: u64,
    outstanding: usize,
}

impl ChainSyncSession {
    /// Connect to the node's chain-sync endpoint.
    pub async fn connect(url: &str) -> Result<Self, SyncError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(SyncError::transport)?;
        tracing::info!(url, "chain-sync session connected");
        Ok(Self {
            ws,
            state: SessionState::Connected,
            next_id: 1,
            outstanding: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Negotiate the point streaming resumes from.
    ///
    /// Candidates are sent in preference order with the origin fallback
    /// appended. `Ok(None)` means no candidate intersected; the session
    /// stays usable and the caller should retry with a different set.
    pub async fn find_intersection(
        &mut self,
        candidates: &[ChainPoint],
    ) -> Result<Option<ChainPoint>, SyncError> {
        let points = with_origin_fallback(candidates);
        let params = serde_json::to_value(&points).map_err(SyncError::desync)?;
        self.state = SessionState::IntersectionRequested;
        self.send("findIntersection", params).await?;

        let response = self.recv_response().await?;
        if response.method != "findIntersection" {
            return Err(SyncError::Desync(format!(
                "expected findIntersection echo, got '{}'",
                response.method
            )));
        }
        let result = response
            .result
            .ok_or_else(|| SyncError::Desync("findIntersection response without result".into()))?;

        match parse_intersection(&result)? {
            IntersectionOutcome::Found(point) => {
                tracing::info!(%point, "intersection established");
                self.state = SessionState::Streaming;
                self.outstanding = 0;
                Ok(Some(point))
            }
            IntersectionOutcome::NotFound => {
                tracing::warn!(
                    candidates = points.len(),
                    "no intersection found for candidate points"
                );
                self.state = SessionState::Connected;
                Ok(None)
            }
        }
    }

    /// Receive the next chain event, keeping the request pipeline full.
    ///
    /// Valid only once an intersection is established.
    pub async fn next_event(&mut self) -> Result<BlockEvent, SyncError> {
        if self.state != SessionState::Streaming {
            return Err(SyncError::NotStreaming);
        }

        while self.outstanding < PIPELINE_DEPTH {
            self.send("nextBlock", serde_json::json!([])).await?;
            self.outstanding += 1;
        }

        let response = self.recv_response().await?;
        self.outstanding -= 1;
        if response.method != "nextBlock" {
            return Err(SyncError::Desync(format!(
                "expected nextBlock echo, got '{}'",
                response.method
            )));
        }
        let result = response
            .result
            .ok_or_else(|| SyncError::Desync("nextBlock response without result".into()))?;
        let result: NextBlockResult =
            serde_json::from_value(result).map_err(SyncError::desync)?;

        match result {
            NextBlockResult::Forward { block } => Ok(BlockEvent::RollForward(block.try_into()?)),
            NextBlockResult::Backward { point } => {
                tracing::info!(%point, "upstream rolled back");
                Ok(BlockEvent::RollBackward(point))
            }
        }
    }

    /// Close the connection, aborting any outstanding requests.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }

    async fn send(&mut self, method: &'static str, params: serde_json::Value) -> Result<(), SyncError> {
        let request = Request {
            method,
            params,
            id: self.next_id,
        };
        self.next_id += 1;
        let text = serde_json::to_string(&request).map_err(SyncError::desync)?;
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(SyncError::transport)
    }

    async fn recv_response(&mut self) -> Result<Response, SyncError> {
        loop {
            let message = self
                .ws
                .next()
                .await
                .ok_or(SyncError::Closed)?
                .map_err(SyncError::transport)?;

            match message {
                Message::Text(text) => {
                    let response: Response =
                        serde_json::from_str(text.as_str()).map_err(SyncError::desync)?;
                    if let Some(err) = response.error {
                        return Err(SyncError::Desync(format!(
                            "upstream error {}: {}",
                            err.code, err.message
                        )));
                    }
                    return Ok(response);
                }
                // Keepalives are handled by the transport.
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => return Err(SyncError::Closed),
                other => {
                    return Err(SyncError::Desync(format!(
                        "unexpected non-text message: {other:?}"
                    )))
                }
            }
        }
    }
}
