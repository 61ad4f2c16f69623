//! Request-fatal ingestion errors.
//!
//! Per-item and per-chunk failures are captured in the response's failure
//! list, never here. The only hard failure of an entire request is a schema
//! that cannot be translated: no partial response is meaningful then.

use snafu::prelude::*;

use crate::schema::translate::SchemaError;

/// Errors that abort a batch request as a whole.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestError {
    /// The entity type's schema could not be resolved or translated.
    #[snafu(display("Schema error for entity type '{entity_type}': {source}"))]
    Schema {
        /// Entity type whose schema failed.
        entity_type: String,
        /// Underlying schema resolution/translation error.
        source: SchemaError,
    },
}
