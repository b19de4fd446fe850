//! Token identities: script hashes and asset classes.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Length of a minting-policy / validator script hash.
pub const SCRIPT_HASH_LEN: usize = 28;

/// Maximum length of an on-chain token name.
pub const MAX_TOKEN_NAME_LEN: usize = 32;

// ─── ScriptHash ───────────────────────────────────────────────────────────────

/// A 28-byte script hash (minting policy or validator).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptHash(pub [u8; SCRIPT_HASH_LEN]);

impl ScriptHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for ScriptHash {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; SCRIPT_HASH_LEN] = bytes.try_into().map_err(|_| TypeError::BadLength {
            expected: SCRIPT_HASH_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", hex::encode(self.0))
    }
}

// ─── AssetClass ───────────────────────────────────────────────────────────────

/// A token kind: currency symbol (empty for ada, else a 28-byte policy hash)
/// plus a token name of up to 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetClass {
    pub currency_symbol: Vec<u8>,
    pub token_name: Vec<u8>,
}

impl AssetClass {
    pub fn new(currency_symbol: Vec<u8>, token_name: Vec<u8>) -> Self {
        Self {
            currency_symbol,
            token_name,
        }
    }

    /// The ada asset class (empty symbol, empty name).
    pub fn ada() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Returns `true` if the symbol is 0 or 28 bytes and the name at most 32.
    pub fn is_well_formed(&self) -> bool {
        (self.currency_symbol.is_empty() || self.currency_symbol.len() == SCRIPT_HASH_LEN)
            && self.token_name.len() <= MAX_TOKEN_NAME_LEN
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            hex::encode(&self.currency_symbol),
            hex::encode(&self.token_name)
        )
    }
}

impl serde::Serialize for AssetClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for AssetClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for AssetClass {
    type Err = TypeError;

    /// Parse the `"<currency hex>.<token hex>"` text form.
    fn from_str(s: &str) -> Result<Self, TypeError> {
        let (currency, token) = s
            .split_once('.')
            .ok_or_else(|| TypeError::BadAssetClass(format!("missing '.' in '{s}'")))?;
        let class = Self::new(hex::decode(currency)?, hex::decode(token)?);
        if !class.is_well_formed() {
            return Err(TypeError::BadAssetClass(format!(
                "symbol must be 0 or {SCRIPT_HASH_LEN} bytes, name at most {MAX_TOKEN_NAME_LEN}"
            )));
        }
        Ok(class)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
