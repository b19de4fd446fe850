//! The driving loop: connect, intersect, stream, reconnect.

use std::time::Duration;

use densindex_core::ChainPoint;
use densindex_store::RegistryStore;
use densindex_sync::{BlockEvent, ChainSyncSession, SyncError};

use crate::config::IndexerConfig;
use crate::error::DriverError;
use crate::ingestor::BlockIngestor;

/// The long-running indexer: owns the store and drives chain-sync sessions
/// against it until cancelled.
pub struct Indexer {
    config: IndexerConfig,
    store: RegistryStore,
    ingestor: BlockIngestor,
}

impl Indexer {
    /// Open the configured database and build the indexer.
    pub async fn new(config: IndexerConfig) -> Result<Self, DriverError> {
        let store = RegistryStore::open(&config.db_path).await?;
        Ok(Self::with_store(config, store))
    }

    /// Build against an existing store (tests, embedded use).
    pub fn with_store(config: IndexerConfig, store: RegistryStore) -> Self {
        let ingestor = BlockIngestor::new(store.clone());
        Self {
            config,
            store,
            ingestor,
        }
    }

    /// The store handle, for read-side consumers sharing this process.
    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Run sessions forever, reconnecting with exponential backoff.
    ///
    /// Every session failure — transport drop, protocol desync, ingest
    /// error — tears the session down and re-runs intersection from the
    /// committed tip; no block is ever skipped.
    pub async fn run(&self) -> Result<(), DriverError> {
        let initial = Duration::from_millis(self.config.backoff_ms);
        let max = Duration::from_millis(self.config.backoff_max_ms);
        let mut backoff = initial;

        loop {
            match self.run_session(&mut backoff, initial).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if matches!(e, DriverError::Ingest(_)) {
                        tracing::error!(error = %e, "ingest failure; not advancing past this block");
                    } else {
                        tracing::warn!(error = %e, "chain-sync session ended, reconnecting in {backoff:?}");
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max);
                }
            }
        }
    }

    /// One session: connect, negotiate an intersection, stream events.
    async fn run_session(
        &self,
        backoff: &mut Duration,
        initial: Duration,
    ) -> Result<(), DriverError> {
        let mut session = ChainSyncSession::connect(&self.config.node_url).await?;

        let candidates: Vec<ChainPoint> = self
            .store
            .recent_points(self.config.recent_points)
            .await?
            .into_iter()
            .map(ChainPoint::from)
            .collect();

        let mut intersection = session.find_intersection(&candidates).await?;
        if intersection.is_none() {
            // Our recent points are all unknown upstream; fall back to a
            // bare origin negotiation before giving up on the session.
            tracing::warn!("no intersection with recent points, retrying from origin");
            intersection = session.find_intersection(&[]).await?;
        }
        let intersection = intersection
            .ok_or_else(|| SyncError::Desync("origin rejected as intersection".into()))?;
        tracing::info!(%intersection, "streaming from intersection");
        *backoff = initial;

        let mut protocol_nft = self
            .store
            .sync_protocol_asset_class(&self.config.protocol_nft)
            .await?;

        loop {
            match session.next_event().await? {
                BlockEvent::RollForward(block) => {
                    // The tracked NFT may be reconfigured externally
                    // between blocks; pick up the change before applying.
                    protocol_nft = self.store.sync_protocol_asset_class(&protocol_nft).await?;
                    self.ingestor.apply_forward(&protocol_nft, &block).await?;
                }
                BlockEvent::RollBackward(point) => {
                    self.ingestor.apply_backward(&point).await?;
                }
            }
        }
    }
}
