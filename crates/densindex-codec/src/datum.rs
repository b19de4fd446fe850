//! Typed projections from a datum tree onto the three registry record
//! shapes, plus the one-shot classifier the ingestor uses.
//!
//! Each projection is pure and total-or-[`TypeMismatch`]; probing a datum
//! against the wrong shape is expected and silent. [`classify`] tries all
//! three in a fixed priority order (protocol, record bundle, name-set node)
//! and warns if a datum somehow satisfies more than one.

use densindex_core::{
    AssetClass, NameSetNode, NodeKey, ProtocolParams, ResourceRecord, ScriptHash,
};
use num_traits::ToPrimitive;

use crate::data::PlutusData;
use crate::encode::encode;
use crate::error::TypeMismatch;

/// The outcome of classifying a single inline datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumKind {
    Protocol(ProtocolParams),
    RecordBundle(Vec<ResourceRecord>),
    NameSetNode(NameSetNode),
    Unrecognized,
}

/// Try every record shape against `data`, in priority order.
pub fn classify(data: &PlutusData) -> DatumKind {
    let protocol = as_protocol(data).ok();
    let bundle = as_record_bundle(data).ok();
    let node = as_name_set_node(data).ok();

    let matched = usize::from(protocol.is_some())
        + usize::from(bundle.is_some())
        + usize::from(node.is_some());
    if matched > 1 {
        tracing::warn!(matched, "datum satisfies more than one record shape, applying the first");
    }

    if let Some(params) = protocol {
        DatumKind::Protocol(params)
    } else if let Some(records) = bundle {
        DatumKind::RecordBundle(records)
    } else if let Some(node) = node {
        DatumKind::NameSetNode(node)
    } else {
        DatumKind::Unrecognized
    }
}

/// Interpret a tree as the protocol singleton: four 28-byte script hashes.
pub fn as_protocol(data: &PlutusData) -> Result<ProtocolParams, TypeMismatch> {
    const SHAPE: &str = "protocol datum";
    let fields = constr0(data, SHAPE)?;
    let [element_id, set_elem, set_validator, records_validator] = fields else {
        return Err(TypeMismatch::new(
            SHAPE,
            format!("expected 4 fields, got {}", fields.len()),
        ));
    };
    Ok(ProtocolParams {
        element_id_policy: script_hash(element_id, SHAPE)?,
        set_elem_policy: script_hash(set_elem, SHAPE)?,
        set_validator: script_hash(set_validator, SHAPE)?,
        records_validator: script_hash(records_validator, SHAPE)?,
    })
}

/// Interpret a tree as a name-set node: key, next, owner-approval token.
pub fn as_name_set_node(data: &PlutusData) -> Result<NameSetNode, TypeMismatch> {
    const SHAPE: &str = "name-set node";
    let fields = constr0(data, SHAPE)?;
    let [key, next, approval] = fields else {
        return Err(TypeMismatch::new(
            SHAPE,
            format!("expected 3 fields, got {}", fields.len()),
        ));
    };
    Ok(NameSetNode {
        key: node_key(key, SHAPE)?,
        next: node_key(next, SHAPE)?,
        owner_approval: asset_class(approval, SHAPE)?,
    })
}

/// Interpret a tree as a record bundle: a list of (ttl, payload) records.
///
/// Payloads stay opaque; they are re-encoded to canonical bytes so the
/// store never depends on this crate's tree type.
pub fn as_record_bundle(data: &PlutusData) -> Result<Vec<ResourceRecord>, TypeMismatch> {
    const SHAPE: &str = "record bundle";
    let fields = constr0(data, SHAPE)?;
    let [records] = fields else {
        return Err(TypeMismatch::new(
            SHAPE,
            format!("expected 1 field, got {}", fields.len()),
        ));
    };
    let items = records
        .as_list()
        .ok_or_else(|| TypeMismatch::new(SHAPE, "records field must be a list"))?;
    items.iter().map(|item| resource_record(item, SHAPE)).collect()
}

// ─── Shape helpers ────────────────────────────────────────────────────────────

fn constr0<'a>(data: &'a PlutusData, shape: &'static str) -> Result<&'a [PlutusData], TypeMismatch> {
    match data.as_constr() {
        Some((0, fields)) => Ok(fields),
        Some((tag, _)) => Err(TypeMismatch::new(shape, format!("constructor tag {tag}"))),
        None => Err(TypeMismatch::new(shape, "not a constructor")),
    }
}

fn script_hash(data: &PlutusData, shape: &'static str) -> Result<ScriptHash, TypeMismatch> {
    let bytes = data
        .as_bytes()
        .ok_or_else(|| TypeMismatch::new(shape, "script hash must be a byte string"))?;
    ScriptHash::try_from(bytes).map_err(|e| TypeMismatch::new(shape, e.to_string()))
}

fn asset_class(data: &PlutusData, shape: &'static str) -> Result<AssetClass, TypeMismatch> {
    let fields = constr0(data, shape)?;
    let [currency, token] = fields else {
        return Err(TypeMismatch::new(shape, "asset class needs 2 fields"));
    };
    let currency = currency
        .as_bytes()
        .ok_or_else(|| TypeMismatch::new(shape, "currency symbol must be a byte string"))?;
    let token = token
        .as_bytes()
        .ok_or_else(|| TypeMismatch::new(shape, "token name must be a byte string"))?;
    let class = AssetClass::new(currency.to_vec(), token.to_vec());
    if !class.is_well_formed() {
        return Err(TypeMismatch::new(shape, "asset class lengths out of range"));
    }
    Ok(class)
}

fn node_key(data: &PlutusData, shape: &'static str) -> Result<NodeKey, TypeMismatch> {
    let fields = constr0(data, shape)?;
    let [name, class] = fields else {
        return Err(TypeMismatch::new(shape, "node key needs 2 fields"));
    };
    let name = name
        .as_bytes()
        .ok_or_else(|| TypeMismatch::new(shape, "node key name must be a byte string"))?;
    Ok(NodeKey {
        name: name.to_vec(),
        class: asset_class(class, shape)?,
    })
}

fn resource_record(data: &PlutusData, shape: &'static str) -> Result<ResourceRecord, TypeMismatch> {
    let fields = constr0(data, shape)?;
    let [ttl, value] = fields else {
        return Err(TypeMismatch::new(shape, "record needs (ttl, value)"));
    };
    let ttl = ttl
        .as_integer()
        .and_then(|n| n.to_u32())
        .ok_or_else(|| TypeMismatch::new(shape, "ttl must fit an unsigned 32-bit integer"))?;
    Ok(ResourceRecord {
        ttl,
        value: encode(value),
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
