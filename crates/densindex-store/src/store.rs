//! The pooled store handle: schema management and concurrent reads.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use densindex_core::{AssetClass, NameSetEntry, Point, ProtocolRecord, ResourceRecord};

use crate::error::StoreError;
use crate::queries::{self, Table};
use crate::session::RegistrySession;

/// Result of a predecessor lookup: the entry a new name would be linked
/// after, plus whether the queried name is itself live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredecessorLookup {
    /// Greatest live entry strictly below the query name, if any.
    pub predecessor: Option<NameSetEntry>,
    /// Whether an entry with exactly the query name is live.
    pub name_exists: bool,
}

/// SQLite-backed registry projection. Cloning shares the pool.
#[derive(Clone)]
pub struct RegistryStore {
    pool: SqlitePool,
}

impl RegistryStore {
    /// Open (or create) a registry database at `path`.
    ///
    /// The path may be a plain file path (`"./dens.db"`) or a full SQLite
    /// URL (`"sqlite:./dens.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(StoreError::db)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory registry. All data is lost when the store is
    /// dropped; a single shared connection so every handle sees the same
    /// database. Ideal for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(StoreError::db)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), StoreError> {
        // WAL mode — snapshot reads stay concurrent with block transactions
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(StoreError::db)?;

        for sql in [
            "CREATE TABLE IF NOT EXISTS points (
                slot     INTEGER PRIMARY KEY,
                block_id BLOB    NOT NULL
            );",
            "CREATE TABLE IF NOT EXISTS live_refs (
                tx_id        BLOB    NOT NULL,
                output_index INTEGER NOT NULL,
                created_slot INTEGER NOT NULL,
                PRIMARY KEY (tx_id, output_index)
            );",
            "CREATE TABLE IF NOT EXISTS protocol (
                id                INTEGER PRIMARY KEY CHECK (id = 0),
                tx_id             BLOB    NOT NULL,
                output_index      INTEGER NOT NULL,
                element_id_policy BLOB    NOT NULL,
                set_elem_policy   BLOB    NOT NULL,
                set_validator     BLOB    NOT NULL,
                records_validator BLOB    NOT NULL,
                created_slot      INTEGER NOT NULL
            );",
            "CREATE TABLE IF NOT EXISTS name_set (
                name             BLOB    PRIMARY KEY,
                pointer_currency BLOB    NOT NULL,
                pointer_token    BLOB    NOT NULL,
                tx_id            BLOB    NOT NULL,
                output_index     INTEGER NOT NULL,
                created_slot     INTEGER NOT NULL
            );",
            "CREATE TABLE IF NOT EXISTS record_bundles (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                name         BLOB    NOT NULL,
                records_json TEXT    NOT NULL,
                tx_id        BLOB    NOT NULL,
                output_index INTEGER NOT NULL,
                created_slot INTEGER NOT NULL
            );",
            "CREATE TABLE IF NOT EXISTS config (
                id           INTEGER PRIMARY KEY CHECK (id = 0),
                nft_currency BLOB    NOT NULL,
                nft_token    BLOB    NOT NULL,
                updated_at   INTEGER NOT NULL
            );",
            // Indexes for the ingest and rollback paths
            "CREATE INDEX IF NOT EXISTS idx_name_set_pointer
                ON name_set (pointer_currency, pointer_token);",
            "CREATE INDEX IF NOT EXISTS idx_name_set_slot ON name_set (created_slot);",
            "CREATE INDEX IF NOT EXISTS idx_live_refs_slot ON live_refs (created_slot);",
            "CREATE INDEX IF NOT EXISTS idx_record_bundles_name ON record_bundles (name);",
            "CREATE INDEX IF NOT EXISTS idx_record_bundles_slot
                ON record_bundles (created_slot);",
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(StoreError::db)?;
        }
        Ok(())
    }

    /// Begin a write transaction scoped to one block or rollback.
    pub async fn begin(&self) -> Result<RegistrySession, StoreError> {
        let tx = self.pool.begin().await.map_err(StoreError::db)?;
        Ok(RegistrySession::new(tx))
    }

    // ─── Concurrent reads ───────────────────────────────────────────────────

    /// The predecessor/existence query backing registration lookups.
    pub async fn select_predecessor(&self, name: &[u8]) -> Result<PredecessorLookup, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::select_predecessor(&mut conn, name).await
    }

    /// The tracked protocol singleton, if one is live.
    pub async fn select_protocol(&self) -> Result<Option<ProtocolRecord>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::select_protocol(&mut conn).await
    }

    /// All live records for a name, flattened across its bundles.
    pub async fn select_records_for_name(
        &self,
        name: &[u8],
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::select_records_for_name(&mut conn, name).await
    }

    /// Most recent indexed points, newest first; seeds intersection finding.
    pub async fn recent_points(&self, limit: u32) -> Result<Vec<Point>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::recent_points(&mut conn, limit).await
    }

    /// The asset class currently tracked as the protocol NFT.
    pub async fn protocol_asset_class(&self) -> Result<Option<AssetClass>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::protocol_asset_class(&mut conn).await
    }

    /// Set the tracked protocol NFT (operator reconfiguration path).
    pub async fn set_protocol_asset_class(&self, class: &AssetClass) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::set_protocol_asset_class(&mut conn, class).await
    }

    /// Reconcile the caller's candidate against the configured class.
    ///
    /// Returns the stored class when it differs (external reconfiguration),
    /// else the candidate unchanged. An empty config row is seeded with the
    /// candidate.
    pub async fn sync_protocol_asset_class(
        &self,
        candidate: &AssetClass,
    ) -> Result<AssetClass, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        match queries::protocol_asset_class(&mut conn).await? {
            Some(stored) if stored != *candidate => {
                tracing::info!(from = %candidate, to = %stored, "protocol asset class reconfigured");
                Ok(stored)
            }
            Some(_) => Ok(candidate.clone()),
            None => {
                queries::set_protocol_asset_class(&mut conn, candidate).await?;
                Ok(candidate.clone())
            }
        }
    }

    // ─── Statistics ─────────────────────────────────────────────────────────

    /// Number of indexed points.
    pub async fn point_count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::count(&mut conn, Table::Points).await
    }

    /// Number of live output references.
    pub async fn live_ref_count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::count(&mut conn, Table::LiveRefs).await
    }

    /// Number of live registered names.
    pub async fn name_count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::count(&mut conn, Table::NameSet).await
    }

    /// Number of live record bundles.
    pub async fn record_bundle_count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::db)?;
        queries::count(&mut conn, Table::RecordBundles).await
    }
}
