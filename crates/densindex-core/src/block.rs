//! The ingest-facing block model: the UTxO delta a block carries.
//!
//! The chain-sync crate converts the node's wire JSON into these types; the
//! ingestor consumes them without knowing anything about the transport.

use std::collections::BTreeMap;
use std::fmt;

use crate::asset::AssetClass;
use crate::point::{Hash32, Point};

// ─── TxOutRef ─────────────────────────────────────────────────────────────────

/// Identity of a produced transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxOutRef {
    pub tx_id: Hash32,
    pub index: u32,
}

impl TxOutRef {
    pub fn new(tx_id: Hash32, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for TxOutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

// ─── Assets ───────────────────────────────────────────────────────────────────

/// Token quantities carried by an output (ada excluded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets(BTreeMap<AssetClass, u64>);

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `class` (accumulating on repeats).
    pub fn add(&mut self, class: AssetClass, quantity: u64) {
        *self.0.entry(class).or_insert(0) += quantity;
    }

    /// Quantity of the given class, zero if absent.
    pub fn quantity_of(&self, class: &AssetClass) -> u64 {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Every asset class present with a positive quantity.
    pub fn classes(&self) -> impl Iterator<Item = &AssetClass> {
        self.0.iter().filter(|(_, q)| **q > 0).map(|(c, _)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AssetClass, u64)> for Assets {
    fn from_iter<I: IntoIterator<Item = (AssetClass, u64)>>(iter: I) -> Self {
        let mut assets = Self::new();
        for (class, quantity) in iter {
            assets.add(class, quantity);
        }
        assets
    }
}

// ─── Block / Transaction / TxOut ──────────────────────────────────────────────

/// A produced output: its token bag and optional inline datum (raw CBOR).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub assets: Assets,
    pub datum: Option<Vec<u8>>,
}

/// One transaction's contribution to the UTxO delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Hash32,
    /// Output references consumed by this transaction.
    pub inputs: Vec<TxOutRef>,
    /// Outputs produced, in index order.
    pub outputs: Vec<TxOut>,
}

/// A block as the ingestor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: Hash32,
    pub slot: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The chain position this block occupies.
    pub fn point(&self) -> Point {
        Point::new(self.slot, self.id)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_accumulate() {
        let class = AssetClass::new(vec![1; 28], b"t".to_vec());
        let mut assets = Assets::new();
        assets.add(class.clone(), 2);
        assets.add(class.clone(), 3);
        assert_eq!(assets.quantity_of(&class), 5);
    }

    #[test]
    fn classes_skip_zero_quantities() {
        let a = AssetClass::new(vec![1; 28], b"a".to_vec());
        let b = AssetClass::new(vec![2; 28], b"b".to_vec());
        let mut assets = Assets::new();
        assets.add(a.clone(), 0);
        assets.add(b.clone(), 1);
        let classes: Vec<_> = assets.classes().cloned().collect();
        assert_eq!(classes, vec![b]);
    }

    #[test]
    fn block_point() {
        let block = Block {
            id: Hash32([9; 32]),
            slot: 1234,
            transactions: vec![],
        };
        assert_eq!(block.point(), Point::new(1234, Hash32([9; 32])));
    }
}
