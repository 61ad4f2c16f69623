//! Materialization of raw field maps into typed records.
//!
//! For each field in the target schema (in schema order), the raw value is
//! looked up by name; absent fields are left null, present fields are
//! coerced to the column type. Raw fields not present in the schema are
//! silently ignored, which keeps ingestion forward-compatible with newer
//! producers.

use std::collections::BTreeMap;

use serde_json::Value as Json;
use snafu::prelude::*;

use crate::{
    record::value::{TypedRecord, TypedValue},
    schema::target::{TargetDataType, TargetSchema},
};

/// Untyped inbound record: a field-name → value mapping.
pub type RawRecord = serde_json::Map<String, Json>;

/// Errors raised while materializing a raw record.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum MaterializeError {
    /// A raw value could not be coerced to its column type.
    ///
    /// Contained to the owning record; sibling records in the same chunk are
    /// unaffected unless the batch runs fail-fast.
    #[snafu(display("Cannot coerce field '{field}' to {target}: invalid value {raw}"))]
    Coercion {
        /// Field path that failed (nested elements use `field[i]` / `field.key`).
        field: String,
        /// Text rendering of the offending raw value.
        raw: String,
        /// Target type the value was being coerced to.
        target: String,
    },
}

/// Materialize a raw record against a target schema.
///
/// The resulting [`TypedRecord`] carries every schema field, in schema
/// order, with absent raw fields as [`TypedValue::Null`].
pub fn materialize(
    raw: &RawRecord,
    schema: &TargetSchema,
) -> Result<TypedRecord, MaterializeError> {
    let mut record = TypedRecord::new();
    for field in schema.fields() {
        let value = match raw.get(&field.name) {
            None => TypedValue::Null,
            Some(json) => coerce(json, &field.data_type, &field.name)?,
        };
        record.push(field.name.clone(), value);
    }
    Ok(record)
}

/// Coerce one raw value to a target data type.
pub(crate) fn coerce(
    json: &Json,
    data_type: &TargetDataType,
    path: &str,
) -> Result<TypedValue, MaterializeError> {
    // An explicit null behaves like an absent field: the column keeps its
    // natural null default.
    if json.is_null() {
        return Ok(TypedValue::Null);
    }

    match data_type {
        TargetDataType::Utf8 => Ok(TypedValue::Utf8(canonical_text(json))),

        TargetDataType::Int32 => match json {
            Json::Number(n) if n.as_i64().is_some_and(|v| i32::try_from(v).is_ok()) => {
                Ok(TypedValue::Int32(n.as_i64().unwrap_or_default() as i32))
            }
            other => parse_text::<i32>(other, path, data_type).map(TypedValue::Int32),
        },

        TargetDataType::Int64 => match json {
            Json::Number(n) if n.as_i64().is_some() => {
                Ok(TypedValue::Int64(n.as_i64().unwrap_or_default()))
            }
            other => parse_text::<i64>(other, path, data_type).map(TypedValue::Int64),
        },

        TargetDataType::Float32 => match json {
            Json::Number(n) if n.as_f64().is_some() => {
                Ok(TypedValue::Float32(n.as_f64().unwrap_or_default() as f32))
            }
            other => parse_text::<f32>(other, path, data_type).map(TypedValue::Float32),
        },

        TargetDataType::Float64 => match json {
            Json::Number(n) if n.as_f64().is_some() => {
                Ok(TypedValue::Float64(n.as_f64().unwrap_or_default()))
            }
            other => parse_text::<f64>(other, path, data_type).map(TypedValue::Float64),
        },

        TargetDataType::Bool => match json {
            Json::Bool(v) => Ok(TypedValue::Bool(*v)),
            other => parse_text::<bool>(other, path, data_type).map(TypedValue::Bool),
        },

        TargetDataType::Binary => match json {
            Json::String(s) => Ok(TypedValue::Binary(s.as_bytes().to_vec())),
            Json::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    let byte = item
                        .as_u64()
                        .and_then(|v| u8::try_from(v).ok())
                        .context(CoercionSnafu {
                            field: path.to_string(),
                            raw: canonical_text(item),
                            target: data_type.to_string(),
                        })?;
                    bytes.push(byte);
                }
                Ok(TypedValue::Binary(bytes))
            }
            other => CoercionSnafu {
                field: path.to_string(),
                raw: canonical_text(other),
                target: data_type.to_string(),
            }
            .fail(),
        },

        TargetDataType::List { element, .. } => match json {
            Json::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let child_path = format!("{path}[{i}]");
                    out.push(coerce(item, element, &child_path)?);
                }
                Ok(TypedValue::List(out))
            }
            other => CoercionSnafu {
                field: path.to_string(),
                raw: canonical_text(other),
                target: data_type.to_string(),
            }
            .fail(),
        },

        TargetDataType::Map { value, .. } => match json {
            Json::Object(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let child_path = format!("{path}.{key}");
                    out.insert(key.clone(), coerce(item, value, &child_path)?);
                }
                Ok(TypedValue::Map(out))
            }
            other => CoercionSnafu {
                field: path.to_string(),
                raw: canonical_text(other),
                target: data_type.to_string(),
            }
            .fail(),
        },
    }
}

/// Canonical text representation of a raw value.
///
/// Strings render without quotes; objects and arrays render as their
/// self-contained JSON text encoding (this is how nested records land in
/// `Utf8` columns).
fn canonical_text(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_text<T: std::str::FromStr>(
    json: &Json,
    path: &str,
    data_type: &TargetDataType,
) -> Result<T, MaterializeError> {
    canonical_text(json)
        .parse::<T>()
        .ok()
        .context(CoercionSnafu {
            field: path.to_string(),
            raw: canonical_text(json),
            target: data_type.to_string(),
        })
}
