//! Chain positions: slots, block ids, and the distinguished origin.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

// ─── Hash32 ───────────────────────────────────────────────────────────────────

/// A 32-byte hash (block id or transaction id), hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for Hash32 {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypeError::BadLength {
            expected: 32,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.0))
    }
}

impl FromStr for Hash32 {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, TypeError> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

// ─── Point ────────────────────────────────────────────────────────────────────

/// A position on the canonical chain: slot number plus block id.
///
/// Totally ordered by slot (then id, for determinism between equal slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Absolute slot number.
    pub slot: u64,
    /// Block id (hex on the wire).
    pub id: Hash32,
}

impl Point {
    pub fn new(slot: u64, id: Hash32) -> Self {
        Self { slot, id }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.slot, self.id)
    }
}

// ─── ChainPoint ───────────────────────────────────────────────────────────────

/// A `Point` or the distinguished origin, which precedes every point.
///
/// Serialises as the chain-sync wire form: the string `"origin"` or a
/// `{"slot": …, "id": "…"}` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPoint {
    Origin,
    Specific(Point),
}

impl ChainPoint {
    pub fn specific(slot: u64, id: Hash32) -> Self {
        Self::Specific(Point::new(slot, id))
    }

    pub fn is_origin(&self) -> bool {
        matches!(self, Self::Origin)
    }

    /// Slot of the point, `None` at origin.
    pub fn slot(&self) -> Option<u64> {
        match self {
            Self::Origin => None,
            Self::Specific(p) => Some(p.slot),
        }
    }
}

impl From<Point> for ChainPoint {
    fn from(p: Point) -> Self {
        Self::Specific(p)
    }
}

impl fmt::Display for ChainPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Specific(p) => write!(f, "{p}"),
        }
    }
}

impl Serialize for ChainPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Origin => serializer.serialize_str("origin"),
            Self::Specific(p) => p.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChainPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChainPointVisitor;

        impl<'de> Visitor<'de> for ChainPointVisitor {
            type Value = ChainPoint;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"origin\" or a point object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ChainPoint, E> {
                if v == "origin" {
                    Ok(ChainPoint::Origin)
                } else {
                    Err(de::Error::unknown_variant(v, &["origin"]))
                }
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<ChainPoint, A::Error> {
                let point = Point::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(ChainPoint::Specific(point))
            }
        }

        deserializer.deserialize_any(ChainPointVisitor)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> Hash32 {
        Hash32([byte; 32])
    }

    #[test]
    fn hash32_hex_roundtrip() {
        let h = hash(0xab);
        let text = h.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(Hash32::from_hex(&text).unwrap(), h);
    }

    #[test]
    fn hash32_rejects_bad_length() {
        assert!(Hash32::from_hex("abcd").is_err());
    }

    #[test]
    fn points_order_by_slot() {
        let a = Point::new(10, hash(1));
        let b = Point::new(20, hash(0));
        assert!(a < b);
    }

    #[test]
    fn chain_point_wire_forms() {
        let origin: ChainPoint = serde_json::from_str("\"origin\"").unwrap();
        assert!(origin.is_origin());

        let p: ChainPoint = serde_json::from_str(&format!(
            "{{\"slot\": 42, \"id\": \"{}\"}}",
            hash(7)
        ))
        .unwrap();
        assert_eq!(p.slot(), Some(42));

        assert_eq!(serde_json::to_string(&ChainPoint::Origin).unwrap(), "\"origin\"");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"slot\":42"));
    }
}
