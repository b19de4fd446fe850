//! The in-memory datum tree.

use num_bigint::BigInt;

/// A decoded on-chain datum: the closed tagged-variant tree every datum
/// reduces to.
///
/// Map entries keep their wire order and keys are not required to be unique
/// at this layer; shape-level decisions belong to [`crate::datum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    /// Arbitrary-precision signed integer.
    Integer(BigInt),
    /// Raw byte string.
    Bytes(Vec<u8>),
    /// Ordered sequence of trees.
    List(Vec<PlutusData>),
    /// Ordered key/value pairs.
    Map(Vec<(PlutusData, PlutusData)>),
    /// Tagged constructor with ordered fields.
    Constr { tag: u64, fields: Vec<PlutusData> },
}

impl PlutusData {
    pub fn integer(n: impl Into<BigInt>) -> Self {
        Self::Integer(n.into())
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(b.into())
    }

    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr { tag, fields }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Self::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PlutusData]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            Self::Constr { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }
}
