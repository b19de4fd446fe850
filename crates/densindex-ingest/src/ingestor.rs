//! The block ingestor: one store transaction per block or rollback.

use densindex_codec::{classify, decode, DatumKind};
use densindex_core::{
    derive_pointer, AssetClass, Block, ChainPoint, NameSetEntry, TxOut, TxOutRef,
};
use densindex_store::{RegistrySession, RegistryStore};

use crate::error::IngestError;

/// Applies block deltas and rollbacks to the registry store.
pub struct BlockIngestor {
    store: RegistryStore,
}

impl BlockIngestor {
    pub fn new(store: RegistryStore) -> Self {
        Self { store }
    }

    /// Apply one block as a single transaction.
    ///
    /// Inserts the block's point (duplicate delivery aborts), then walks
    /// every transaction in block order: consumed references are deleted
    /// (cascading), produced references inserted in index order, and each
    /// inline datum classified and applied. A datum that fails to decode
    /// is logged and skipped; the block still commits.
    pub async fn apply_forward(
        &self,
        protocol_nft: &AssetClass,
        block: &Block,
    ) -> Result<(), IngestError> {
        let mut session = self.store.begin().await?;
        session.insert_point(&block.point()).await?;

        for tx in &block.transactions {
            for input in &tx.inputs {
                session.delete_live_ref(input).await?;
            }
            for (index, output) in tx.outputs.iter().enumerate() {
                let tx_out_ref = TxOutRef::new(tx.id, index as u32);
                session.insert_live_ref(&tx_out_ref, block.slot).await?;

                let Some(datum) = &output.datum else { continue };
                match decode(datum) {
                    Ok(tree) => {
                        self.apply_datum(
                            &mut session,
                            protocol_nft,
                            &tx_out_ref,
                            output,
                            classify(&tree),
                            block.slot,
                        )
                        .await?;
                    }
                    Err(e) => {
                        tracing::warn!(at = %tx_out_ref, error = %e, "skipping undecodable datum");
                    }
                }
            }
        }

        session.commit().await?;
        tracing::info!(
            point = %block.point(),
            txs = block.transactions.len(),
            "block applied"
        );
        Ok(())
    }

    async fn apply_datum(
        &self,
        session: &mut RegistrySession,
        protocol_nft: &AssetClass,
        tx_out_ref: &TxOutRef,
        output: &TxOut,
        kind: DatumKind,
        slot: u64,
    ) -> Result<(), IngestError> {
        match kind {
            DatumKind::Protocol(params) => {
                // Only the output holding the tracked NFT is the protocol
                // instance; anyone can emit a protocol-shaped datum.
                if output.assets.quantity_of(protocol_nft) > 0 {
                    session.insert_protocol(tx_out_ref, &params, slot).await?;
                } else {
                    tracing::debug!(
                        at = %tx_out_ref,
                        "protocol-shaped datum without the tracked NFT, ignored"
                    );
                }
            }
            DatumKind::RecordBundle(records) => {
                // The bundle's datum carries no name; it is resolved from
                // the live entry whose pointer token rides on this output.
                let classes: Vec<AssetClass> = output.assets.classes().cloned().collect();
                match session.select_name_by_pointer(&classes).await? {
                    Some(name) => {
                        session
                            .insert_record_bundle(&name, tx_out_ref, &records, slot)
                            .await?;
                    }
                    None => {
                        tracing::debug!(
                            at = %tx_out_ref,
                            "record bundle without a matching name pointer, ignored"
                        );
                    }
                }
            }
            DatumKind::NameSetNode(node) => {
                let protocol = session.select_protocol().await?.ok_or(
                    IngestError::MissingProtocol {
                        tx_out_ref: *tx_out_ref,
                    },
                )?;
                let pointer = derive_pointer(
                    &protocol.params.set_elem_policy,
                    &node.key.class,
                    &node.key.name,
                );
                let entry = NameSetEntry {
                    name: node.key.name,
                    pointer,
                    tx_out_ref: *tx_out_ref,
                };
                session.insert_name_set_entry(&entry, slot).await?;
            }
            DatumKind::Unrecognized => {
                tracing::debug!(at = %tx_out_ref, "datum matches no registry shape, skipped");
            }
        }
        Ok(())
    }

    /// Undo every point after the target, as one transaction.
    pub async fn apply_backward(&self, target: &ChainPoint) -> Result<(), IngestError> {
        let mut session = self.store.begin().await?;
        session.roll_back_to(target).await?;
        session.commit().await?;
        tracing::info!(%target, "rolled back to target");
        Ok(())
    }
}
