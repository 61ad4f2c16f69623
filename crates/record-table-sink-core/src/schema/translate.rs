//! Translation from source schemas to the flat target schema.
//!
//! Translation is pure and deterministic: the same source schema always
//! yields the same target schema, independent of call order. Results are
//! therefore safe to cache and reuse across every batch of the same entity
//! type (see [`crate::schema::cache`]).
//!
//! Field-level rules:
//! - primitives map 1:1, non-nullable;
//! - `Nullable(inner)` translates `inner` and forces `nullable = true`;
//! - unions of 2+ non-null branches collapse to nullable `Utf8` (a
//!   deliberate lossy default: heterogeneous unions cannot be represented
//!   losslessly in the flat target model);
//! - arrays and maps translate their element/value type, with element
//!   nullability only when the element is itself nullable or a union;
//! - enums become non-nullable `Utf8` (the symbol's string literal);
//! - nested records become non-nullable `Utf8`, carried as a self-contained
//!   JSON text encoding rather than flattened into columns.

use snafu::prelude::*;

use crate::schema::{
    source::{PrimitiveKind, SourceSchemaNode},
    target::{SchemaConvertError, TargetDataType, TargetField, TargetSchema},
};

/// Errors raised while translating a source schema.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaError {
    /// Only top-level records are translatable into a column schema.
    #[snafu(display("Top-level source schema must be a record, got {kind}"))]
    NotARecord {
        /// Kind of the top-level node that was rejected.
        kind: String,
    },

    /// Translation produced an invalid target schema (duplicate columns).
    /// Unreachable for source records validated at construction, but kept
    /// for records deserialized from untrusted input.
    #[snafu(display("Translated schema is invalid: {source}"))]
    InvalidTarget {
        /// Underlying target schema construction error.
        source: SchemaConvertError,
    },

    /// No source schema is registered for the requested entity type.
    #[snafu(display("Unknown entity type: {entity_type}"))]
    UnknownEntityType {
        /// Entity-type name that could not be resolved.
        entity_type: String,
    },
}

/// Translate a top-level `Record` source schema into a target schema.
///
/// Fails with [`SchemaError::NotARecord`] if the top-level node is anything
/// other than a record. A record with zero fields translates to a valid
/// target schema with zero columns.
pub fn translate(source: &SourceSchemaNode) -> Result<TargetSchema, SchemaError> {
    let fields = match source {
        SourceSchemaNode::Record { fields } => fields,
        other => {
            return NotARecordSnafu {
                kind: other.kind_name().to_string(),
            }
            .fail();
        }
    };

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let (data_type, nullable) = translate_node(&field.node);
        columns.push(TargetField {
            name: field.name.clone(),
            data_type,
            nullable,
        });
    }

    TargetSchema::new(columns).context(InvalidTargetSnafu)
}

/// Translate one field-level node into a data type plus nullability.
fn translate_node(node: &SourceSchemaNode) -> (TargetDataType, bool) {
    match node {
        SourceSchemaNode::Primitive(kind) => (translate_primitive(*kind), false),

        SourceSchemaNode::Nullable(inner) => {
            let (data_type, _) = translate_node(inner);
            (data_type, true)
        }

        // 2+ non-null branches: pick the universal representable type
        // rather than failing.
        SourceSchemaNode::Union(_) => (TargetDataType::Utf8, true),

        SourceSchemaNode::Array(element) => {
            let (element_type, _) = translate_node(element);
            (
                TargetDataType::List {
                    element: Box::new(element_type),
                    element_nullable: element_is_nullable(element),
                },
                false,
            )
        }

        SourceSchemaNode::Map(value) => {
            let (value_type, _) = translate_node(value);
            (
                TargetDataType::Map {
                    value: Box::new(value_type),
                    value_nullable: element_is_nullable(value),
                },
                false,
            )
        }

        SourceSchemaNode::Enum { .. } => (TargetDataType::Utf8, false),

        // Nested records are deliberately not flattened.
        SourceSchemaNode::Record { .. } => (TargetDataType::Utf8, false),
    }
}

fn translate_primitive(kind: PrimitiveKind) -> TargetDataType {
    match kind {
        PrimitiveKind::String => TargetDataType::Utf8,
        PrimitiveKind::Int32 => TargetDataType::Int32,
        PrimitiveKind::Int64 => TargetDataType::Int64,
        PrimitiveKind::Float32 => TargetDataType::Float32,
        PrimitiveKind::Float64 => TargetDataType::Float64,
        PrimitiveKind::Bool => TargetDataType::Bool,
        PrimitiveKind::Bytes => TargetDataType::Binary,
    }
}

/// Array elements and map values are nullable only when the node is itself
/// nullable or a complex union.
fn element_is_nullable(node: &SourceSchemaNode) -> bool {
    matches!(
        node,
        SourceSchemaNode::Nullable(_) | SourceSchemaNode::Union(_)
    )
}
