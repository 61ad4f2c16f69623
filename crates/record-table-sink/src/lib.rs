//! # record-table-sink
//!
//! Batch ingestion of structured records into a versioned transactional
//! table store, with schema translation from a tagged-union source model.
//!
//! This crate is the supported public entry point and provides a small,
//! stable surface.
//!
//! ## Example
//!
//! ```rust,ignore
//! use record_table_sink::prelude::*;
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Schema namespace (wrapper-only).
pub mod schema {
    pub use record_table_sink_core::schema::{
        translate, InMemorySchemaRegistry, PrimitiveKind, SchemaCache, SchemaConvertError,
        SchemaError, SchemaSource, SourceField, SourceSchemaNode, TargetDataType, TargetField,
        TargetSchema,
    };
}

/// Record materialization namespace (wrapper-only).
pub mod record {
    pub use record_table_sink_core::record::{
        materialize, materialize_into, MaterializeError, MaterializeWarning, RawRecord,
        RecordEntity, SetterTable, TypedRecord, TypedValue,
    };
}

pub use record_table_sink_core::batch::{
    BatchCoordinator, BatchOptions, BatchRequest, BatchResponse, BatchStatistics, FailureDetail,
    FailureKind, IngestError, OptionsError,
};
pub use record_table_sink_core::dedup::{field_identity, find_duplicates, IdentityKeyFn};
pub use record_table_sink_core::writer::{
    CommitError, CommitReceipt, MemoryTableWriter, TableWriter,
};
