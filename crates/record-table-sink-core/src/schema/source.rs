//! Source schema model.
//!
//! A source schema is the tagged-union type description attached to each
//! incoming record before translation. Only a top-level `Record` is
//! translatable; everything else can appear as a field type.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Primitive kinds a source schema may declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// UTF-8 string.
    String,
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
    Bytes,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::String => write!(f, "string"),
            PrimitiveKind::Int32 => write!(f, "int32"),
            PrimitiveKind::Int64 => write!(f, "int64"),
            PrimitiveKind::Float32 => write!(f, "float32"),
            PrimitiveKind::Float64 => write!(f, "float64"),
            PrimitiveKind::Bool => write!(f, "bool"),
            PrimitiveKind::Bytes => write!(f, "bytes"),
        }
    }
}

/// Named field inside a source `Record` node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceField {
    /// Field name as declared by the source schema.
    pub name: String,
    /// Type node for the field.
    pub node: SourceSchemaNode,
}

/// One node of a source schema tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceSchemaNode {
    /// A primitive leaf type.
    Primitive(PrimitiveKind),

    /// A union of exactly one non-null branch plus null.
    Nullable(Box<SourceSchemaNode>),

    /// A union of two or more non-null branches (null may or may not be
    /// among the declared branches; translation collapses it either way).
    Union(Vec<SourceSchemaNode>),

    /// A homogeneous array of elements.
    Array(Box<SourceSchemaNode>),

    /// A map from string keys to values. Source key type declarations other
    /// than string are not modeled; keys are string at the target level.
    Map(Box<SourceSchemaNode>),

    /// An enumeration; symbol values are carried as their string literals.
    Enum {
        /// Declared symbols, in declaration order.
        symbols: Vec<String>,
    },

    /// A record with an ordered sequence of uniquely-named fields.
    Record {
        /// Ordered fields of the record.
        fields: Vec<SourceField>,
    },
}

impl SourceSchemaNode {
    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceSchemaNode::Primitive(_) => "primitive",
            SourceSchemaNode::Nullable(_) => "nullable",
            SourceSchemaNode::Union(_) => "union",
            SourceSchemaNode::Array(_) => "array",
            SourceSchemaNode::Map(_) => "map",
            SourceSchemaNode::Enum { .. } => "enum",
            SourceSchemaNode::Record { .. } => "record",
        }
    }

    /// Build a record node, rejecting duplicate or empty field names.
    pub fn record(fields: Vec<SourceField>) -> Result<Self, SourceSchemaError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.trim().is_empty() {
                return EmptyFieldNameSnafu.fail();
            }
            if !seen.insert(field.name.as_str()) {
                return DuplicateFieldSnafu {
                    field: field.name.clone(),
                }
                .fail();
            }
        }
        Ok(SourceSchemaNode::Record { fields })
    }
}

impl fmt::Display for SourceSchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSchemaNode::Primitive(kind) => write!(f, "{kind}"),
            SourceSchemaNode::Nullable(inner) => write!(f, "{inner}?"),
            SourceSchemaNode::Union(branches) => {
                write!(f, "union[")?;
                for (i, b) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{b}")?;
                }
                write!(f, "]")
            }
            SourceSchemaNode::Array(element) => write!(f, "array<{element}>"),
            SourceSchemaNode::Map(value) => write!(f, "map<string, {value}>"),
            SourceSchemaNode::Enum { symbols } => {
                write!(f, "enum{{")?;
                for (i, s) in symbols.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{s}")?;
                }
                write!(f, "}}")
            }
            SourceSchemaNode::Record { fields } => {
                write!(f, "record{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.node)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Errors raised while constructing a source schema node.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SourceSchemaError {
    /// Duplicate field names within a record are not allowed.
    #[snafu(display("Duplicate field name in record: {field}"))]
    DuplicateField {
        /// The duplicate field name.
        field: String,
    },

    /// Record field names must be non-empty.
    #[snafu(display("Record field name must be non-empty"))]
    EmptyFieldName,
}
