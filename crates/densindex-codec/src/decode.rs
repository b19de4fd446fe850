//! Decoding untrusted datum bytes into a [`PlutusData`] tree.
//!
//! The reader walks the CBOR fragment Plutus data occupies: unsigned and
//! negative integer heads, bignum tags 2/3, definite byte strings,
//! definite or indefinite lists and maps, and the constructor tags
//! (121–127, 1280–1535, and the general 102 form). Anything else is either
//! `Malformed` (broken structure) or `Unsupported` (valid CBOR outside the
//! datum model). No input can panic the reader.

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use crate::data::PlutusData;
use crate::error::DecodeError;

/// Nesting cap for untrusted input; datum trees are shallow in practice.
const MAX_DEPTH: usize = 128;

/// Decode a complete datum. Trailing bytes after the first item are an error.
pub fn decode(bytes: &[u8]) -> Result<PlutusData, DecodeError> {
    let mut reader = Reader { input: bytes, pos: 0 };
    let item = reader.read_item(0)?;
    if reader.pos != bytes.len() {
        return Err(DecodeError::Malformed(format!(
            "{} trailing byte(s) after datum",
            bytes.len() - reader.pos
        )));
    }
    Ok(item)
}

/// Length part of a CBOR head.
enum Len {
    Definite(u64),
    Indefinite,
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| DecodeError::Malformed("unexpected end of input".into()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| DecodeError::Malformed("truncated input".into()))?;
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a head byte plus its length argument.
    fn read_head(&mut self) -> Result<(u8, Len), DecodeError> {
        let byte = self.read_u8()?;
        let major = byte >> 5;
        let additional = byte & 0x1f;
        let len = match additional {
            0..=23 => Len::Definite(u64::from(additional)),
            24 => Len::Definite(u64::from(self.read_u8()?)),
            25 => {
                let b = self.read_exact(2)?;
                Len::Definite(u64::from(u16::from_be_bytes([b[0], b[1]])))
            }
            26 => {
                let b = self.read_exact(4)?;
                Len::Definite(u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
            }
            27 => {
                let b = self.read_exact(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                Len::Definite(u64::from_be_bytes(buf))
            }
            28..=30 => {
                return Err(DecodeError::Malformed(format!(
                    "reserved length header {additional}"
                )))
            }
            _ => Len::Indefinite,
        };
        Ok((major, len))
    }

    fn read_item(&mut self, depth: usize) -> Result<PlutusData, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::Malformed("nesting exceeds depth limit".into()));
        }
        let (major, len) = self.read_head()?;
        match major {
            0 => match len {
                Len::Definite(v) => Ok(PlutusData::Integer(BigInt::from(v))),
                Len::Indefinite => Err(DecodeError::Malformed(
                    "indefinite length on integer".into(),
                )),
            },
            1 => match len {
                Len::Definite(v) => Ok(PlutusData::Integer(-BigInt::from(v) - 1)),
                Len::Indefinite => Err(DecodeError::Malformed(
                    "indefinite length on integer".into(),
                )),
            },
            2 => match len {
                Len::Definite(n) => {
                    let n = usize::try_from(n)
                        .map_err(|_| DecodeError::Malformed("byte string too long".into()))?;
                    Ok(PlutusData::Bytes(self.read_exact(n)?.to_vec()))
                }
                Len::Indefinite => Err(DecodeError::Unsupported(
                    "indefinite-length byte string".into(),
                )),
            },
            3 => Err(DecodeError::Unsupported("text string".into())),
            4 => Ok(PlutusData::List(self.read_list_body(len, depth)?)),
            5 => Ok(PlutusData::Map(self.read_map_body(len, depth)?)),
            6 => {
                let tag = match len {
                    Len::Definite(v) => v,
                    Len::Indefinite => {
                        return Err(DecodeError::Malformed("indefinite length on tag".into()))
                    }
                };
                self.read_tagged(tag, depth)
            }
            _ => {
                // Major 7: floats, simple values, or a stray break code.
                if len_is_indefinite(&len) {
                    Err(DecodeError::Malformed("unexpected break code".into()))
                } else {
                    Err(DecodeError::Unsupported(
                        "floats and simple values".into(),
                    ))
                }
            }
        }
    }

    fn read_list_body(&mut self, len: Len, depth: usize) -> Result<Vec<PlutusData>, DecodeError> {
        let mut items = Vec::new();
        match len {
            Len::Definite(n) => {
                for _ in 0..n {
                    items.push(self.read_item(depth + 1)?);
                }
            }
            Len::Indefinite => loop {
                if self.peek() == Some(0xff) {
                    self.pos += 1;
                    break;
                }
                items.push(self.read_item(depth + 1)?);
            },
        }
        Ok(items)
    }

    fn read_map_body(
        &mut self,
        len: Len,
        depth: usize,
    ) -> Result<Vec<(PlutusData, PlutusData)>, DecodeError> {
        let mut pairs = Vec::new();
        match len {
            Len::Definite(n) => {
                for _ in 0..n {
                    let key = self.read_item(depth + 1)?;
                    let value = self.read_item(depth + 1)?;
                    pairs.push((key, value));
                }
            }
            Len::Indefinite => loop {
                if self.peek() == Some(0xff) {
                    self.pos += 1;
                    break;
                }
                let key = self.read_item(depth + 1)?;
                if self.peek() == Some(0xff) {
                    return Err(DecodeError::Malformed("odd number of map items".into()));
                }
                let value = self.read_item(depth + 1)?;
                pairs.push((key, value));
            },
        }
        Ok(pairs)
    }

    fn read_tagged(&mut self, tag: u64, depth: usize) -> Result<PlutusData, DecodeError> {
        match tag {
            // Bignums: a byte-string payload holding the big-endian magnitude.
            2 | 3 => {
                let payload = self.read_item(depth + 1)?;
                let magnitude = payload.as_bytes().ok_or_else(|| {
                    DecodeError::Malformed("bignum payload must be a byte string".into())
                })?;
                let n = BigInt::from_bytes_be(Sign::Plus, magnitude);
                Ok(PlutusData::Integer(if tag == 2 { n } else { -n - 1 }))
            }
            // Compact constructor tags 0..=6.
            121..=127 => Ok(PlutusData::Constr {
                tag: tag - 121,
                fields: self.read_constr_fields(depth)?,
            }),
            // Compact constructor tags 7..=127.
            1280..=1400 => Ok(PlutusData::Constr {
                tag: 7 + (tag - 1280),
                fields: self.read_constr_fields(depth)?,
            }),
            // General constructor form: [tag, [fields…]].
            102 => {
                let (major, len) = self.read_head()?;
                if major != 4 {
                    return Err(DecodeError::Malformed(
                        "general constructor must wrap an array".into(),
                    ));
                }
                let items = self.read_list_body(len, depth)?;
                let [tag_item, fields_item]: [PlutusData; 2] =
                    items.try_into().map_err(|_| {
                        DecodeError::Malformed(
                            "general constructor needs exactly [tag, fields]".into(),
                        )
                    })?;
                let tag = tag_item
                    .as_integer()
                    .and_then(|n| n.to_u64())
                    .ok_or_else(|| {
                        DecodeError::Malformed(
                            "general constructor tag must be an unsigned integer".into(),
                        )
                    })?;
                let fields = match fields_item {
                    PlutusData::List(fields) => fields,
                    _ => {
                        return Err(DecodeError::Malformed(
                            "general constructor fields must be an array".into(),
                        ))
                    }
                };
                Ok(PlutusData::Constr { tag, fields })
            }
            other => Err(DecodeError::Unsupported(format!("tag {other}"))),
        }
    }

    fn read_constr_fields(&mut self, depth: usize) -> Result<Vec<PlutusData>, DecodeError> {
        let (major, len) = self.read_head()?;
        if major != 4 {
            return Err(DecodeError::Malformed(
                "constructor fields must be an array".into(),
            ));
        }
        self.read_list_body(len, depth)
    }
}

fn len_is_indefinite(len: &Len) -> bool {
    matches!(len, Len::Indefinite)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
