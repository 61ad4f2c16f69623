//! Entity capability trait and setter-table materialization.
//!
//! Batch and schema logic never operate against concrete target types.
//! [`RecordEntity`] is the minimal contract (get/set field by name) that the
//! generic field-map path works through, and [`SetterTable`] is the second
//! materialization mode: an explicit, per-target-type dispatch table from
//! field name to a typed setter function, built once and reused. A field
//! with no setter is skipped with a recorded warning, never an error — the
//! generic path always remains available.

use std::{collections::HashMap, fmt};

use tracing::warn;

use crate::{
    record::{
        materialize::{self, MaterializeError, RawRecord},
        value::{TypedRecord, TypedValue},
    },
    schema::target::TargetSchema,
};

/// Minimal record-like capability: field access by name.
pub trait RecordEntity {
    /// Read a field value by name.
    fn get_field(&self, name: &str) -> Option<&TypedValue>;

    /// Assign a field value by name.
    fn set_field(&mut self, name: &str, value: TypedValue);
}

impl RecordEntity for TypedRecord {
    fn get_field(&self, name: &str) -> Option<&TypedValue> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: TypedValue) {
        self.push(name, value);
    }
}

/// Materialize a raw record into any [`RecordEntity`] via generic field
/// assignment. This is the first-class fallback path; it never produces
/// warnings because every schema field is assignable by name.
pub fn materialize_into<E: RecordEntity>(
    entity: &mut E,
    raw: &RawRecord,
    schema: &TargetSchema,
) -> Result<(), MaterializeError> {
    for field in schema.fields() {
        let value = match raw.get(&field.name) {
            None => TypedValue::Null,
            Some(json) => materialize::coerce(json, &field.data_type, &field.name)?,
        };
        entity.set_field(&field.name, value);
    }
    Ok(())
}

/// Non-fatal condition recorded during setter-table materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeWarning {
    /// No setter is registered for a schema field; the field was skipped.
    SetterNotFound {
        /// Name of the skipped field.
        field: String,
    },
}

impl fmt::Display for MaterializeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeWarning::SetterNotFound { field } => {
                write!(f, "no setter registered for field '{field}'; skipped")
            }
        }
    }
}

/// Value kinds a setter can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetterType {
    Utf8,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Binary,
}

fn value_kind(value: &TypedValue) -> Option<SetterType> {
    match value {
        TypedValue::Utf8(_) => Some(SetterType::Utf8),
        TypedValue::Int32(_) => Some(SetterType::Int32),
        TypedValue::Int64(_) => Some(SetterType::Int64),
        TypedValue::Float32(_) => Some(SetterType::Float32),
        TypedValue::Float64(_) => Some(SetterType::Float64),
        TypedValue::Bool(_) => Some(SetterType::Bool),
        TypedValue::Binary(_) => Some(SetterType::Binary),
        TypedValue::Null | TypedValue::List(_) | TypedValue::Map(_) => None,
    }
}

/// Compatible-type fallback: widen the value to the accepted kind when no
/// exact match exists. Any value is compatible with a text setter via its
/// canonical text representation; integers widen to long, and numeric
/// values widen to double.
fn adapt(value: TypedValue, accepts: SetterType) -> Option<TypedValue> {
    if value_kind(&value) == Some(accepts) {
        return Some(value);
    }
    match (accepts, &value) {
        (SetterType::Utf8, _) => Some(TypedValue::Utf8(value.to_text())),
        (SetterType::Int64, TypedValue::Int32(v)) => Some(TypedValue::Int64(i64::from(*v))),
        (SetterType::Float64, TypedValue::Int32(v)) => Some(TypedValue::Float64(f64::from(*v))),
        (SetterType::Float64, TypedValue::Int64(v)) => Some(TypedValue::Float64(*v as f64)),
        (SetterType::Float64, TypedValue::Float32(v)) => Some(TypedValue::Float64(f64::from(*v))),
        (SetterType::Float32, TypedValue::Int32(v)) => Some(TypedValue::Float32(*v as f32)),
        _ => None,
    }
}

type SetterFn<T> = Box<dyn Fn(&mut T, TypedValue) + Send + Sync>;

struct SetterEntry<T> {
    accepts: SetterType,
    apply: SetterFn<T>,
}

/// Per-target-type dispatch table from field name to a typed setter.
///
/// Built once per target type (typically alongside the translated schema)
/// and reused for every record of that entity type.
pub struct SetterTable<T> {
    setters: HashMap<String, SetterEntry<T>>,
}

impl<T> Default for SetterTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SetterTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterTable")
            .field("fields", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> SetterTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
        }
    }

    fn register(
        mut self,
        field: &str,
        accepts: SetterType,
        apply: SetterFn<T>,
    ) -> Self {
        self.setters
            .insert(field.to_string(), SetterEntry { accepts, apply });
        self
    }

    /// Register a string setter for `field`.
    pub fn with_utf8(self, field: &str, set: impl Fn(&mut T, String) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Utf8,
            Box::new(move |t, v| {
                if let TypedValue::Utf8(s) = v {
                    set(t, s);
                }
            }),
        )
    }

    /// Register a 32-bit integer setter for `field`.
    pub fn with_int32(self, field: &str, set: impl Fn(&mut T, i32) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Int32,
            Box::new(move |t, v| {
                if let TypedValue::Int32(i) = v {
                    set(t, i);
                }
            }),
        )
    }

    /// Register a 64-bit integer setter for `field`.
    pub fn with_int64(self, field: &str, set: impl Fn(&mut T, i64) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Int64,
            Box::new(move |t, v| {
                if let TypedValue::Int64(i) = v {
                    set(t, i);
                }
            }),
        )
    }

    /// Register a 32-bit float setter for `field`.
    pub fn with_float32(self, field: &str, set: impl Fn(&mut T, f32) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Float32,
            Box::new(move |t, v| {
                if let TypedValue::Float32(x) = v {
                    set(t, x);
                }
            }),
        )
    }

    /// Register a 64-bit float setter for `field`.
    pub fn with_float64(self, field: &str, set: impl Fn(&mut T, f64) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Float64,
            Box::new(move |t, v| {
                if let TypedValue::Float64(x) = v {
                    set(t, x);
                }
            }),
        )
    }

    /// Register a boolean setter for `field`.
    pub fn with_bool(self, field: &str, set: impl Fn(&mut T, bool) + Send + Sync + 'static) -> Self {
        self.register(
            field,
            SetterType::Bool,
            Box::new(move |t, v| {
                if let TypedValue::Bool(b) = v {
                    set(t, b);
                }
            }),
        )
    }

    /// Register a binary setter for `field`.
    pub fn with_binary(
        self,
        field: &str,
        set: impl Fn(&mut T, Vec<u8>) + Send + Sync + 'static,
    ) -> Self {
        self.register(
            field,
            SetterType::Binary,
            Box::new(move |t, v| {
                if let TypedValue::Binary(b) = v {
                    set(t, b);
                }
            }),
        )
    }

    /// Materialize a raw record into a fresh `T` through this table.
    ///
    /// Each schema field is coerced exactly as in the generic path, then
    /// dispatched to its setter. Null values leave the target's default in
    /// place. Fields without a setter (or whose value cannot be adapted to
    /// the setter's accepted type) are skipped with a
    /// [`MaterializeWarning::SetterNotFound`]; coercion failures remain
    /// hard per-record errors.
    pub fn materialize(
        &self,
        raw: &RawRecord,
        schema: &TargetSchema,
    ) -> Result<(T, Vec<MaterializeWarning>), MaterializeError>
    where
        T: Default,
    {
        let mut target = T::default();
        let mut warnings = Vec::new();

        for field in schema.fields() {
            let value = match raw.get(&field.name) {
                None => continue,
                Some(json) => materialize::coerce(json, &field.data_type, &field.name)?,
            };
            if value.is_null() {
                continue;
            }

            let Some(entry) = self.setters.get(&field.name) else {
                warn!(field = %field.name, "no setter registered; skipping field");
                warnings.push(MaterializeWarning::SetterNotFound {
                    field: field.name.clone(),
                });
                continue;
            };

            match adapt(value, entry.accepts) {
                Some(adapted) => (entry.apply)(&mut target, adapted),
                None => {
                    warn!(field = %field.name, "no compatible setter; skipping field");
                    warnings.push(MaterializeWarning::SetterNotFound {
                        field: field.name.clone(),
                    });
                }
            }
        }

        Ok((target, warnings))
    }
}
