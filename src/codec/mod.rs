//! Value codec
//!
//! Turns property values into the byte strings stored in cell values and
//! index row keys, and back. The first byte of every encoding is a
//! [`ValueTag`]. Primitive tags produce byte strings whose unsigned
//! lexicographic order matches the natural order of the value, so index
//! tables can be range-scanned. The `Serialized` tag marks an opaque
//! bincode payload that only supports equality.

pub mod value;

pub use value::{PropertyMap, PropertyValue};

use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Null is not a storable value
    #[error("Null values cannot be encoded")]
    NullValue,

    /// Zero-length input
    #[error("Empty input")]
    Empty,

    /// First byte is not a known tag
    #[error("Unknown value tag: 0x{0:02x}")]
    UnknownTag(u8),

    /// Payload length does not match the tag
    #[error("Malformed {tag:?} payload: expected {expected} bytes, got {actual}")]
    Truncated {
        tag: ValueTag,
        expected: usize,
        actual: usize,
    },

    /// String payload is not UTF-8
    #[error("Invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Opaque payload failed to (de)serialize
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Type discriminant stored as the first byte of an encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    String = b's',
    Integer = b'i',
    Float = b'f',
    Boolean = b'b',
    DateTime = b't',
    /// bincode-serialized value (bytes, arrays, maps)
    Serialized = b'z',
}

impl ValueTag {
    pub fn from_byte(byte: u8) -> CodecResult<Self> {
        match byte {
            b's' => Ok(ValueTag::String),
            b'i' => Ok(ValueTag::Integer),
            b'f' => Ok(ValueTag::Float),
            b'b' => Ok(ValueTag::Boolean),
            b't' => Ok(ValueTag::DateTime),
            b'z' => Ok(ValueTag::Serialized),
            other => Err(CodecError::UnknownTag(other)),
        }
    }

    /// True when the encoded bytes order like the values they encode.
    pub fn is_comparable(self) -> bool {
        !matches!(self, ValueTag::Serialized)
    }

    pub fn of(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(_) => Some(ValueTag::String),
            PropertyValue::Integer(_) => Some(ValueTag::Integer),
            PropertyValue::Float(_) => Some(ValueTag::Float),
            PropertyValue::Boolean(_) => Some(ValueTag::Boolean),
            PropertyValue::DateTime(_) => Some(ValueTag::DateTime),
            PropertyValue::Bytes(_) | PropertyValue::Array(_) | PropertyValue::Map(_) => {
                Some(ValueTag::Serialized)
            }
            PropertyValue::Null => None,
        }
    }
}

const SIGN_BIT: u64 = 1 << 63;

fn order_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ SIGN_BIT).to_be_bytes()
}

fn unorder_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_BIT) as i64
}

fn order_f64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let ordered = if bits & SIGN_BIT != 0 { !bits } else { bits | SIGN_BIT };
    ordered.to_be_bytes()
}

fn unorder_f64(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered & SIGN_BIT != 0 { ordered ^ SIGN_BIT } else { !ordered };
    f64::from_bits(bits)
}

/// Encode a property value.
pub fn encode(value: &PropertyValue) -> CodecResult<Vec<u8>> {
    let tag = ValueTag::of(value).ok_or(CodecError::NullValue)?;
    let mut out = vec![tag as u8];
    match value {
        PropertyValue::String(s) => out.extend_from_slice(s.as_bytes()),
        PropertyValue::Integer(i) | PropertyValue::DateTime(i) => {
            out.extend_from_slice(&order_i64(*i))
        }
        PropertyValue::Float(f) => out.extend_from_slice(&order_f64(*f)),
        PropertyValue::Boolean(b) => out.push(u8::from(*b)),
        PropertyValue::Bytes(_) | PropertyValue::Array(_) | PropertyValue::Map(_) => {
            out.extend_from_slice(&bincode::serialize(value)?)
        }
        PropertyValue::Null => return Err(CodecError::NullValue),
    }
    Ok(out)
}

fn fixed8(tag: ValueTag, payload: &[u8]) -> CodecResult<[u8; 8]> {
    payload.try_into().map_err(|_| CodecError::Truncated {
        tag,
        expected: 8,
        actual: payload.len(),
    })
}

/// Decode bytes produced by [`encode`], restoring its variant.
pub fn decode(bytes: &[u8]) -> CodecResult<PropertyValue> {
    let (&first, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    let tag = ValueTag::from_byte(first)?;
    let value = match tag {
        ValueTag::String => PropertyValue::String(String::from_utf8(payload.to_vec())?),
        ValueTag::Integer => PropertyValue::Integer(unorder_i64(fixed8(tag, payload)?)),
        ValueTag::DateTime => PropertyValue::DateTime(unorder_i64(fixed8(tag, payload)?)),
        ValueTag::Float => PropertyValue::Float(unorder_f64(fixed8(tag, payload)?)),
        ValueTag::Boolean => match payload {
            [b] => PropertyValue::Boolean(*b != 0),
            _ => {
                return Err(CodecError::Truncated {
                    tag,
                    expected: 1,
                    actual: payload.len(),
                })
            }
        },
        ValueTag::Serialized => bincode::deserialize(payload)?,
    };
    Ok(value)
}

/// Tag of an already-encoded value.
pub fn tag_of(bytes: &[u8]) -> CodecResult<ValueTag> {
    bytes
        .first()
        .ok_or(CodecError::Empty)
        .and_then(|b| ValueTag::from_byte(*b))
}
