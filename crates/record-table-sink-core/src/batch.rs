//! Batch ingestion pipeline.
//!
//! `coordinator` is the top-level orchestrator: it screens duplicates,
//! chunks the batch, materializes and commits each chunk through the table
//! writer, and aggregates the outcome into a [`response::BatchResponse`].
//! `options` and `response` hold the request/response model, `stats` the
//! timing aggregation, and `error` the request-fatal error type.

pub mod coordinator;
pub mod error;
pub mod options;
pub mod response;
pub mod stats;

pub use coordinator::BatchCoordinator;
pub use error::IngestError;
pub use options::{BatchOptions, BatchRequest, OptionsError};
pub use response::{BatchResponse, FailureDetail, FailureKind};
pub use stats::BatchStatistics;
