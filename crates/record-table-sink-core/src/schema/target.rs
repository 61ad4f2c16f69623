//! Target schema model.
//!
//! The target schema is the flat, strictly-typed column schema understood by
//! the storage layer, plus conversion to Arrow so Arrow-native table writers
//! can consume it directly.

use std::{collections::HashSet, fmt, sync::Arc};

use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Data types a target column may carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TargetDataType {
    /// UTF-8 encoded string.
    Utf8,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Boolean value.
    Bool,
    /// Variable-length binary data.
    Binary,

    /// List with a single element type.
    List {
        /// Element data type.
        element: Box<TargetDataType>,
        /// Whether individual elements may be null.
        element_nullable: bool,
    },

    /// Map from string keys to values. Keys are always non-null strings.
    Map {
        /// Value data type.
        value: Box<TargetDataType>,
        /// Whether individual values may be null.
        value_nullable: bool,
    },
}

impl TargetDataType {
    fn to_arrow_datatype(&self) -> DataType {
        match self {
            TargetDataType::Utf8 => DataType::Utf8,
            TargetDataType::Int32 => DataType::Int32,
            TargetDataType::Int64 => DataType::Int64,
            TargetDataType::Float32 => DataType::Float32,
            TargetDataType::Float64 => DataType::Float64,
            TargetDataType::Bool => DataType::Boolean,
            TargetDataType::Binary => DataType::Binary,

            TargetDataType::List {
                element,
                element_nullable,
            } => {
                let element_field: FieldRef = Arc::new(Field::new(
                    "item",
                    element.to_arrow_datatype(),
                    *element_nullable,
                ));
                DataType::List(element_field)
            }

            TargetDataType::Map {
                value,
                value_nullable,
            } => {
                // Canonical Arrow Map field names are "entries", "key", "value".
                let key_field: FieldRef = Arc::new(Field::new("key", DataType::Utf8, false));
                let val_field: FieldRef =
                    Arc::new(Field::new("value", value.to_arrow_datatype(), *value_nullable));
                let entries_dt = DataType::Struct(Fields::from(vec![key_field, val_field]));
                let entries_field: FieldRef = Arc::new(Field::new("entries", entries_dt, false));
                DataType::Map(entries_field, false)
            }
        }
    }
}

impl fmt::Display for TargetDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDataType::Utf8 => write!(f, "utf8"),
            TargetDataType::Int32 => write!(f, "int32"),
            TargetDataType::Int64 => write!(f, "int64"),
            TargetDataType::Float32 => write!(f, "float32"),
            TargetDataType::Float64 => write!(f, "float64"),
            TargetDataType::Bool => write!(f, "bool"),
            TargetDataType::Binary => write!(f, "binary"),
            TargetDataType::List {
                element,
                element_nullable,
            } => {
                if *element_nullable {
                    write!(f, "list<{element}?>")
                } else {
                    write!(f, "list<{element}>")
                }
            }
            TargetDataType::Map {
                value,
                value_nullable,
            } => {
                if *value_nullable {
                    write!(f, "map<utf8, {value}?>")
                } else {
                    write!(f, "map<utf8, {value}>")
                }
            }
        }
    }
}

/// Single column definition in a target schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetField {
    /// Column name; matches the originating source field name exactly.
    pub name: String,
    /// Column data type.
    pub data_type: TargetDataType,
    /// Whether the column allows null values.
    pub nullable: bool,
}

impl TargetField {
    fn to_arrow_field_ref(&self) -> FieldRef {
        Arc::new(Field::new(
            self.name.clone(),
            self.data_type.to_arrow_datatype(),
            self.nullable,
        ))
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?: {}", self.name, self.data_type)
        } else {
            write!(f, "{}: {}", self.name, self.data_type)
        }
    }
}

/// Ordered, uniquely-named collection of target columns.
///
/// Field order is preserved relative to the source record's field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetSchema {
    fields: Vec<TargetField>,
}

impl TargetSchema {
    /// Construct a validated target schema (rejects duplicate column names).
    pub fn new(fields: Vec<TargetField>) -> Result<Self, SchemaConvertError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return DuplicateColumnSnafu {
                    column: field.name.clone(),
                }
                .fail();
            }
        }
        Ok(Self { fields })
    }

    /// Borrow the target columns in schema order.
    pub fn fields(&self) -> &[TargetField] {
        &self.fields
    }

    /// Look up a column by name.
    pub fn field(&self, name: &str) -> Option<&TargetField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Convert this target schema to an owned Arrow [`Schema`].
    pub fn to_arrow_schema(&self) -> Schema {
        let fields: Vec<Field> = self
            .fields
            .iter()
            .map(|f| f.to_arrow_field_ref().as_ref().clone())
            .collect();
        Schema::new(fields)
    }

    /// Convert this target schema to a shared Arrow [`SchemaRef`].
    ///
    /// This is a convenience wrapper around [`Self::to_arrow_schema`].
    pub fn to_arrow_schema_ref(&self) -> SchemaRef {
        Arc::new(self.to_arrow_schema())
    }
}

/// Errors raised while constructing a target schema.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaConvertError {
    /// Duplicate column names are not allowed.
    #[snafu(display("Duplicate column name: {column}"))]
    DuplicateColumn {
        /// The duplicate column name.
        column: String,
    },
}
