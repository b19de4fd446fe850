//! densindex-codec — the on-chain binary codec and typed datum decoders.
//!
//! Two layers:
//! - [`decode`]/[`encode`] convert the chain's compact binary datum encoding
//!   to and from the [`PlutusData`] tree. Decoding never trusts its input;
//!   encoding is canonical so byte-level comparisons stay stable.
//! - [`datum`] interprets a tree as one of the three registry record shapes
//!   (protocol singleton, name-set node, record bundle), permissively.

pub mod data;
pub mod datum;
pub mod decode;
pub mod encode;
pub mod error;

pub use data::PlutusData;
pub use datum::{as_name_set_node, as_protocol, as_record_bundle, classify, DatumKind};
pub use decode::decode;
pub use encode::encode;
pub use error::{DecodeError, TypeMismatch};
