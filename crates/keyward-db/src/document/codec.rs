//! Identifier codec for the document store.
//!
//! UUIDs are stored as a tagged binary envelope:
//!
//! ```text
//! { "subtype": 128, "data": "<16 bytes, lowercase hex>" }
//! ```
//!
//! The subtype is taken from the user-defined range (`0x80`) instead of
//! the generic UUID subtype (`0x04`), whose byte order differs between
//! drivers. Decoding accepts that exact envelope and nothing else: a bare
//! UUID string, an envelope with another subtype, or a payload of the
//! wrong length is an error.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Private binary subtype marking a keyward identifier.
pub const ID_SUBTYPE: u8 = 0x80;

const SUBTYPE_KEY: &str = "subtype";
const DATA_KEY: &str = "data";
const ID_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot decode {0} into a UUID")]
    UnsupportedRepresentation(&'static str),

    #[error("unsupported binary subtype {0:#04x} for UUID")]
    UnsupportedSubtype(u64),

    #[error("UUID payload must be 16 bytes, got {0}")]
    InvalidLength(usize),

    #[error("UUID payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Encoder/decoder pair for identifiers stored in the document store.
///
/// Built once by [`DocumentStore::init`](super::DocumentStore::init) and
/// shared read-only by every repository created from that handle.
#[derive(Debug, Clone, Copy)]
pub struct IdCodec {
    subtype: u8,
}

impl IdCodec {
    pub(crate) fn new() -> Self {
        Self {
            subtype: ID_SUBTYPE,
        }
    }

    pub fn encode(&self, id: Uuid) -> Value {
        let mut envelope = Map::with_capacity(2);
        envelope.insert(SUBTYPE_KEY.into(), Value::from(self.subtype));
        envelope.insert(DATA_KEY.into(), Value::String(hex::encode(id.as_bytes())));
        Value::Object(envelope)
    }

    pub fn decode(&self, value: &Value) -> Result<Uuid, CodecError> {
        let envelope = match value {
            Value::Object(envelope) => envelope,
            Value::Null => return Err(CodecError::UnsupportedRepresentation("null")),
            Value::String(_) => return Err(CodecError::UnsupportedRepresentation("string")),
            Value::Array(_) => return Err(CodecError::UnsupportedRepresentation("array")),
            Value::Number(_) => return Err(CodecError::UnsupportedRepresentation("number")),
            Value::Bool(_) => return Err(CodecError::UnsupportedRepresentation("bool")),
        };
        if envelope.len() != 2 {
            return Err(CodecError::UnsupportedRepresentation("object"));
        }

        let subtype = envelope
            .get(SUBTYPE_KEY)
            .and_then(Value::as_u64)
            .ok_or(CodecError::UnsupportedRepresentation("object"))?;
        if subtype != u64::from(self.subtype) {
            return Err(CodecError::UnsupportedSubtype(subtype));
        }

        let data = envelope
            .get(DATA_KEY)
            .and_then(Value::as_str)
            .ok_or(CodecError::UnsupportedRepresentation("object"))?;
        let bytes = hex::decode(data)?;
        let bytes: [u8; ID_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::InvalidLength(bytes.len()))?;

        Ok(Uuid::from_bytes(bytes))
    }
}
