//! Canonical encoding of a [`PlutusData`] tree.
//!
//! One byte string per tree: minimal-length integer heads, bignum tags only
//! past the 64-bit range, definite lengths everywhere, and the compact
//! constructor tags whenever the tag fits them. Decoding what this module
//! emits always reproduces the input tree.

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use crate::data::PlutusData;

/// Encode a datum tree into its canonical byte form.
pub fn encode(data: &PlutusData) -> Vec<u8> {
    let mut out = Vec::new();
    write_item(data, &mut out);
    out
}

fn write_head(major: u8, value: u64, out: &mut Vec<u8>) {
    let base = major << 5;
    match value {
        0..=23 => out.push(base | value as u8),
        24..=0xff => {
            out.push(base | 24);
            out.push(value as u8);
        }
        0x100..=0xffff => {
            out.push(base | 25);
            out.extend_from_slice(&(value as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(base | 26);
            out.extend_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            out.push(base | 27);
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}

fn write_item(data: &PlutusData, out: &mut Vec<u8>) {
    match data {
        PlutusData::Integer(n) => write_integer(n, out),
        PlutusData::Bytes(bytes) => {
            write_head(2, bytes.len() as u64, out);
            out.extend_from_slice(bytes);
        }
        PlutusData::List(items) => {
            write_head(4, items.len() as u64, out);
            for item in items {
                write_item(item, out);
            }
        }
        PlutusData::Map(pairs) => {
            write_head(5, pairs.len() as u64, out);
            for (key, value) in pairs {
                write_item(key, out);
                write_item(value, out);
            }
        }
        PlutusData::Constr { tag, fields } => write_constr(*tag, fields, out),
    }
}

fn write_integer(n: &BigInt, out: &mut Vec<u8>) {
    if n.sign() == Sign::Minus {
        // Encoded as -(1 + m).
        let m = -(n.clone() + 1i32);
        match m.to_u64() {
            Some(v) => write_head(1, v, out),
            None => {
                write_head(6, 3, out);
                write_magnitude(&m, out);
            }
        }
    } else {
        match n.to_u64() {
            Some(v) => write_head(0, v, out),
            None => {
                write_head(6, 2, out);
                write_magnitude(n, out);
            }
        }
    }
}

fn write_magnitude(n: &BigInt, out: &mut Vec<u8>) {
    let bytes = n.magnitude().to_bytes_be();
    write_head(2, bytes.len() as u64, out);
    out.extend_from_slice(&bytes);
}

fn write_constr(tag: u64, fields: &[PlutusData], out: &mut Vec<u8>) {
    match tag {
        0..=6 => write_head(6, 121 + tag, out),
        7..=127 => write_head(6, 1280 + (tag - 7), out),
        _ => {
            // General form: 102([tag, [fields…]]).
            write_head(6, 102, out);
            write_head(4, 2, out);
            write_head(0, tag, out);
        }
    }
    write_head(4, fields.len() as u64, out);
    for field in fields {
        write_item(field, out);
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
