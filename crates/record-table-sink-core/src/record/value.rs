//! Typed values and records.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A value coerced to a target column type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypedValue {
    /// Absent or explicitly null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Variable-length binary data.
    Binary(Vec<u8>),
    /// List of element values.
    List(Vec<TypedValue>),
    /// Map from string keys to values, sorted by key.
    Map(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Render the value as its canonical text representation.
    ///
    /// Used when the identity of a committed row needs a string form.
    pub fn to_text(&self) -> String {
        match self {
            TypedValue::Null => "null".to_string(),
            TypedValue::Bool(v) => v.to_string(),
            TypedValue::Int32(v) => v.to_string(),
            TypedValue::Int64(v) => v.to_string(),
            TypedValue::Float32(v) => v.to_string(),
            TypedValue::Float64(v) => v.to_string(),
            TypedValue::Utf8(v) => v.clone(),
            TypedValue::Binary(v) => format!("0x{}", hex_lower(v)),
            TypedValue::List(items) => {
                let parts: Vec<String> = items.iter().map(TypedValue::to_text).collect();
                format!("[{}]", parts.join(", "))
            }
            TypedValue::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// A typed row conforming to a target schema.
///
/// Fields are kept in schema order; lookup by name is linear, which is fine
/// for the flat, narrow schemas produced by translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TypedRecord {
    fields: Vec<(String, TypedValue)>,
}

impl TypedRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Replaces the value if the name is already present.
    pub fn push(&mut self, name: impl Into<String>, value: TypedValue) {
        let name = name.into();
        if let Some((_, slot)) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            *slot = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
