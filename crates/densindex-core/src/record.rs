//! Registry record types and the pointer-token derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::asset::{AssetClass, ScriptHash};
use crate::block::TxOutRef;

// ─── Protocol ─────────────────────────────────────────────────────────────────

/// The four script hashes that identify a registry protocol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Mints the per-name element-id tokens.
    pub element_id_policy: ScriptHash,
    /// Mints the set-element pointer tokens.
    pub set_elem_policy: ScriptHash,
    /// Guards the on-chain sorted name set.
    pub set_validator: ScriptHash,
    /// Guards the per-name record outputs.
    pub records_validator: ScriptHash,
}

/// The tracked protocol singleton: where it lives plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolRecord {
    pub tx_out_ref: TxOutRef,
    pub params: ProtocolParams,
}

// ─── Name set ─────────────────────────────────────────────────────────────────

/// A (name, asset class) pair as carried inside a name-set node datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub name: Vec<u8>,
    pub class: AssetClass,
}

/// A decoded on-chain name-set node: one link of the sorted name list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSetNode {
    pub key: NodeKey,
    pub next: NodeKey,
    pub owner_approval: AssetClass,
}

/// A live registered name as projected into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSetEntry {
    pub name: Vec<u8>,
    pub pointer: AssetClass,
    pub tx_out_ref: TxOutRef,
}

// ─── Records ──────────────────────────────────────────────────────────────────

/// One resource record: a TTL plus an opaque payload kept as canonical
/// datum-CBOR bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub ttl: u32,
    #[serde(with = "hex_payload")]
    pub value: Vec<u8>,
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Pointer derivation ───────────────────────────────────────────────────────

/// Derive the pointer asset class for a name-set node.
///
/// The token name is a SHA-256 over the node key's asset class and name,
/// each component length-prefixed so distinct (class, name) splits can
/// never collide.
pub fn derive_pointer(set_elem_policy: &ScriptHash, class: &AssetClass, name: &[u8]) -> AssetClass {
    let mut hasher = Sha256::new();
    for part in [
        class.currency_symbol.as_slice(),
        class.token_name.as_slice(),
        name,
    ] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    AssetClass::new(set_elem_policy.as_bytes().to_vec(), hasher.finalize().to_vec())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(byte: u8) -> ScriptHash {
        ScriptHash([byte; 28])
    }

    #[test]
    fn pointer_is_deterministic() {
        let class = AssetClass::new(vec![1; 28], b"id".to_vec());
        let a = derive_pointer(&policy(7), &class, b"google.com");
        let b = derive_pointer(&policy(7), &class, b"google.com");
        assert_eq!(a, b);
        assert_eq!(a.currency_symbol, vec![7; 28]);
        assert_eq!(a.token_name.len(), 32);
    }

    #[test]
    fn pointer_separates_class_and_name() {
        // Moving a byte between the token name and the entry name must
        // change the derived pointer.
        let left = AssetClass::new(vec![1; 28], b"ab".to_vec());
        let right = AssetClass::new(vec![1; 28], b"a".to_vec());
        let with_left = derive_pointer(&policy(7), &left, b"cd");
        let with_right = derive_pointer(&policy(7), &right, b"bcd");
        assert_ne!(with_left, with_right);
    }

    #[test]
    fn pointer_varies_with_name() {
        let class = AssetClass::new(vec![1; 28], b"id".to_vec());
        let a = derive_pointer(&policy(7), &class, b"a.com");
        let b = derive_pointer(&policy(7), &class, b"b.com");
        assert_ne!(a, b);
    }

    #[test]
    fn resource_record_json_roundtrip() {
        let record = ResourceRecord {
            ttl: 3600,
            value: vec![0xd8, 0x79, 0x80],
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ResourceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
