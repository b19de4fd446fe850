//! One write transaction over the registry.

use sqlx::{Sqlite, Transaction};

use densindex_core::{
    AssetClass, ChainPoint, NameSetEntry, Point, ProtocolParams, ProtocolRecord, ResourceRecord,
    TxOutRef,
};

use crate::error::StoreError;
use crate::queries;

/// A scoped registry transaction: every operation commits atomically on
/// [`commit`](Self::commit), or none does. Dropping the session without
/// committing rolls everything back, so an aborted block leaves no trace.
pub struct RegistrySession {
    tx: Transaction<'static, Sqlite>,
}

impl RegistrySession {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Record the point a block occupies. Fails with
    /// [`StoreError::DuplicatePoint`] if the slot is already indexed.
    pub async fn insert_point(&mut self, point: &Point) -> Result<(), StoreError> {
        queries::insert_point(&mut self.tx, point).await
    }

    /// Discard every point after the target and everything it produced.
    pub async fn roll_back_to(&mut self, target: &ChainPoint) -> Result<(), StoreError> {
        queries::roll_back_to(&mut self.tx, target).await
    }

    pub async fn insert_live_ref(
        &mut self,
        tx_out_ref: &TxOutRef,
        created_slot: u64,
    ) -> Result<(), StoreError> {
        queries::insert_live_ref(&mut self.tx, tx_out_ref, created_slot).await
    }

    /// Delete a consumed reference, cascading to dependent registry rows.
    pub async fn delete_live_ref(&mut self, tx_out_ref: &TxOutRef) -> Result<(), StoreError> {
        queries::delete_live_ref(&mut self.tx, tx_out_ref).await
    }

    pub async fn live_ref_exists(&mut self, tx_out_ref: &TxOutRef) -> Result<bool, StoreError> {
        queries::live_ref_exists(&mut self.tx, tx_out_ref).await
    }

    /// Upsert the protocol singleton.
    pub async fn insert_protocol(
        &mut self,
        tx_out_ref: &TxOutRef,
        params: &ProtocolParams,
        created_slot: u64,
    ) -> Result<(), StoreError> {
        queries::insert_protocol(&mut self.tx, tx_out_ref, params, created_slot).await
    }

    /// The protocol singleton as visible inside this transaction.
    pub async fn select_protocol(&mut self) -> Result<Option<ProtocolRecord>, StoreError> {
        queries::select_protocol(&mut self.tx).await
    }

    pub async fn insert_name_set_entry(
        &mut self,
        entry: &NameSetEntry,
        created_slot: u64,
    ) -> Result<(), StoreError> {
        queries::insert_name_set_entry(&mut self.tx, entry, created_slot).await
    }

    /// Resolve the name owning one of the given pointer classes.
    pub async fn select_name_by_pointer(
        &mut self,
        classes: &[AssetClass],
    ) -> Result<Option<Vec<u8>>, StoreError> {
        queries::select_name_by_pointer(&mut self.tx, classes).await
    }

    pub async fn insert_record_bundle(
        &mut self,
        name: &[u8],
        tx_out_ref: &TxOutRef,
        records: &[ResourceRecord],
        created_slot: u64,
    ) -> Result<(), StoreError> {
        queries::insert_record_bundle(&mut self.tx, name, tx_out_ref, records, created_slot).await
    }

    /// Commit the transaction, making every change visible to readers at
    /// once.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::db)
    }
}
