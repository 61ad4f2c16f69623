//! Schema model and translation.
//!
//! The `source` module models the self-describing, tagged-union schema that
//! arrives attached to incoming records. The `target` module models the flat
//! column schema understood by the storage layer. `translate` maps one into
//! the other, and `cache` memoizes the (deterministic) translation per
//! entity type.

pub mod cache;
pub mod source;
pub mod target;
pub mod translate;

pub use cache::{InMemorySchemaRegistry, SchemaCache, SchemaSource};
pub use source::{PrimitiveKind, SourceField, SourceSchemaNode};
pub use target::{SchemaConvertError, TargetDataType, TargetField, TargetSchema};
pub use translate::{translate, SchemaError};
