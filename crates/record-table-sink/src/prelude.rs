//! Wrapper prelude.
//!
//! The `record-table-sink` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::{record, schema};
pub use crate::{
    BatchCoordinator, BatchOptions, BatchRequest, BatchResponse, BatchStatistics, CommitError,
    CommitReceipt, FailureDetail, FailureKind, IngestError, MemoryTableWriter, TableWriter,
};
