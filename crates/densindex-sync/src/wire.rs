//! Chain-sync wire types.
//!
//! Requests are `{method, params, id}` objects; responses echo `method`.
//! Only two methods exist: `findIntersection` (params: ordered point list,
//! always terminated by `"origin"`) and `nextBlock` (params: empty).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use densindex_core::{Assets, Block, ChainPoint, Hash32, Transaction, TxOut, TxOutRef};

use crate::error::SyncError;

// ─── Requests / responses ─────────────────────────────────────────────────────

/// A chain-sync request.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub method: &'static str,
    pub params: Value,
    pub id: u64,
}

/// A chain-sync response, disambiguated by the echoed method.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub method: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<WireError>,
}

/// An error object attached to a response.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub code: i64,
    pub message: String,
}

/// Candidate list for `findIntersection`: preference order with the origin
/// fallback always last.
pub fn with_origin_fallback(candidates: &[ChainPoint]) -> Vec<ChainPoint> {
    let mut points = candidates.to_vec();
    if points.last() != Some(&ChainPoint::Origin) {
        points.push(ChainPoint::Origin);
    }
    points
}

/// Outcome of an intersection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntersectionOutcome {
    Found(ChainPoint),
    NotFound,
}

/// Parse a `findIntersection` result payload.
pub fn parse_intersection(result: &Value) -> Result<IntersectionOutcome, SyncError> {
    if let Some(point) = result.get("intersection") {
        let point: ChainPoint =
            serde_json::from_value(point.clone()).map_err(SyncError::desync)?;
        return Ok(IntersectionOutcome::Found(point));
    }
    if result.get("intersectionNotFound").is_some() {
        return Ok(IntersectionOutcome::NotFound);
    }
    Err(SyncError::Desync(format!(
        "unrecognised findIntersection result: {result}"
    )))
}

/// A `nextBlock` result: the chain moved forward or rolled back.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum NextBlockResult {
    Forward { block: BlockWire },
    Backward { point: ChainPoint },
}

// ─── Block JSON ───────────────────────────────────────────────────────────────

/// A block as the node serialises it; converted into the core model before
/// leaving this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockWire {
    pub id: String,
    pub slot: u64,
    #[serde(default)]
    pub transactions: Vec<TransactionWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionWire {
    pub id: String,
    #[serde(default)]
    pub inputs: Vec<InputWire>,
    #[serde(default)]
    pub outputs: Vec<OutputWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputWire {
    pub transaction: TxIdWire,
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxIdWire {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputWire {
    /// currency symbol hex → token name hex → quantity; the `"ada"` entry
    /// carries lovelace and is not an asset class.
    #[serde(default)]
    pub value: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(default)]
    pub datum: Option<String>,
}

impl TryFrom<BlockWire> for Block {
    type Error = SyncError;

    fn try_from(wire: BlockWire) -> Result<Self, SyncError> {
        let transactions = wire
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Block {
            id: parse_hash(&wire.id)?,
            slot: wire.slot,
            transactions,
        })
    }
}

impl TryFrom<TransactionWire> for Transaction {
    type Error = SyncError;

    fn try_from(wire: TransactionWire) -> Result<Self, SyncError> {
        let inputs = wire
            .inputs
            .into_iter()
            .map(|input| Ok(TxOutRef::new(parse_hash(&input.transaction.id)?, input.index)))
            .collect::<Result<_, SyncError>>()?;
        let outputs = wire
            .outputs
            .into_iter()
            .map(TxOut::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Transaction {
            id: parse_hash(&wire.id)?,
            inputs,
            outputs,
        })
    }
}

impl TryFrom<OutputWire> for TxOut {
    type Error = SyncError;

    fn try_from(wire: OutputWire) -> Result<Self, SyncError> {
        let mut assets = Assets::new();
        for (currency, tokens) in &wire.value {
            if currency == "ada" {
                continue;
            }
            let currency = hex::decode(currency).map_err(SyncError::desync)?;
            for (token, quantity) in tokens {
                let token = hex::decode(token).map_err(SyncError::desync)?;
                assets.add(
                    densindex_core::AssetClass::new(currency.clone(), token),
                    *quantity,
                );
            }
        }
        let datum = wire
            .datum
            .map(|datum| hex::decode(&datum).map_err(SyncError::desync))
            .transpose()?;
        Ok(TxOut { assets, datum })
    }
}

fn parse_hash(s: &str) -> Result<Hash32, SyncError> {
    Hash32::from_hex(s).map_err(SyncError::desync)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use densindex_core::{AssetClass, Point};

    fn hash_hex(byte: u8) -> String {
        hex::encode([byte; 32])
    }

    #[test]
    fn request_wire_shape() {
        let req = Request {
            method: "findIntersection",
            params: serde_json::json!([]),
            id: 3,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"method\":\"findIntersection\""));
        assert!(json.contains("\"params\":[]"));
        assert!(json.contains("\"id\":3"));
    }

    #[test]
    fn origin_fallback_is_appended_once() {
        let p = ChainPoint::Specific(Point::new(7, Hash32([1; 32])));
        assert_eq!(
            with_origin_fallback(&[p]),
            vec![p, ChainPoint::Origin]
        );
        assert_eq!(
            with_origin_fallback(&[p, ChainPoint::Origin]),
            vec![p, ChainPoint::Origin]
        );
        assert_eq!(with_origin_fallback(&[]), vec![ChainPoint::Origin]);
    }

    #[test]
    fn intersection_outcomes_parse() {
        let found: Value = serde_json::json!({
            "intersection": { "slot": 12, "id": hash_hex(1) }
        });
        assert_eq!(
            parse_intersection(&found).unwrap(),
            IntersectionOutcome::Found(ChainPoint::specific(12, Hash32([1; 32])))
        );

        let origin: Value = serde_json::json!({ "intersection": "origin" });
        assert_eq!(
            parse_intersection(&origin).unwrap(),
            IntersectionOutcome::Found(ChainPoint::Origin)
        );

        let missed: Value = serde_json::json!({ "intersectionNotFound": { "tip": "origin" } });
        assert_eq!(parse_intersection(&missed).unwrap(), IntersectionOutcome::NotFound);

        assert!(parse_intersection(&serde_json::json!({})).is_err());
    }

    #[test]
    fn next_block_directions_parse() {
        let forward: NextBlockResult = serde_json::from_value(serde_json::json!({
            "direction": "forward",
            "block": { "id": hash_hex(2), "slot": 100, "transactions": [] }
        }))
        .unwrap();
        assert!(matches!(forward, NextBlockResult::Forward { .. }));

        let backward: NextBlockResult = serde_json::from_value(serde_json::json!({
            "direction": "backward",
            "point": "origin"
        }))
        .unwrap();
        assert!(matches!(
            backward,
            NextBlockResult::Backward { point: ChainPoint::Origin }
        ));
    }

    #[test]
    fn block_conversion_extracts_delta() {
        let policy = hex::encode([5u8; 28]);
        let wire: BlockWire = serde_json::from_value(serde_json::json!({
            "id": hash_hex(2),
            "slot": 100,
            "transactions": [{
                "id": hash_hex(3),
                "inputs": [{ "transaction": { "id": hash_hex(1) }, "index": 0 }],
                "outputs": [{
                    "value": {
                        "ada": { "lovelace": 2_000_000u64 },
                        (policy): { "64656e73": 1u64 }
                    },
                    "datum": "d87980"
                }]
            }]
        }))
        .unwrap();

        let block = Block::try_from(wire).unwrap();
        assert_eq!(block.slot, 100);
        let tx = &block.transactions[0];
        assert_eq!(tx.inputs, vec![TxOutRef::new(Hash32([1; 32]), 0)]);
        let out = &tx.outputs[0];
        assert_eq!(out.datum.as_deref(), Some(&[0xd8u8, 0x79, 0x80][..]));
        let class = AssetClass::new(vec![5; 28], b"dens".to_vec());
        assert_eq!(out.assets.quantity_of(&class), 1);
        // The ada entry never becomes an asset class.
        assert_eq!(out.assets.classes().count(), 1);
    }

    #[test]
    fn bad_hex_is_desync() {
        let wire: BlockWire = serde_json::from_value(serde_json::json!({
            "id": "zz",
            "slot": 1,
            "transactions": []
        }))
        .unwrap();
        assert!(matches!(
            Block::try_from(wire),
            Err(SyncError::Desync(_))
        ));
    }
}
