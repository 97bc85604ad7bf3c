//! Values held in property cells and index rows

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A typed property value
///
/// Scalars encode to order-preserving bytes; `Bytes`, `Array` and `Map`
/// are stored opaque. `Null` is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Milliseconds since the Unix epoch
    DateTime(i64),
    Bytes(Vec<u8>),
    Array(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Null,
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Variant name, used in lookup errors
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::DateTime(_) => "DateTime",
            PropertyValue::Bytes(_) => "Bytes",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Map(_) => "Map",
            PropertyValue::Null => "Null",
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{:?}", s),
            PropertyValue::Integer(i) | PropertyValue::DateTime(i) => write!(f, "{}", i),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            PropertyValue::Array(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            PropertyValue::Map(map) => {
                f.write_str("{")?;
                write_joined(f, map.iter().map(|(k, v)| format!("{}: {}", k, v)))?;
                f.write_str("}")
            }
            PropertyValue::Null => f.write_str("null"),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for PropertyValue {
            fn from(value: $source) -> Self {
                PropertyValue::$variant(value.into())
            }
        })*
    };
}

impl_from! {
    String => String,
    &str => String,
    i64 => Integer,
    i32 => Integer,
    f64 => Float,
    bool => Boolean,
    Vec<u8> => Bytes,
    Vec<PropertyValue> => Array,
    BTreeMap<String, PropertyValue> => Map,
}

impl From<chrono::DateTime<chrono::Utc>> for PropertyValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        PropertyValue::DateTime(dt.timestamp_millis())
    }
}

/// Properties resident on a vertex or edge handle
pub type PropertyMap = HashMap<String, PropertyValue>;
