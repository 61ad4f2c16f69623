//! Batch request and per-request processing options.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::record::materialize::RawRecord;

/// Default chunk size when the caller does not specify one.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Per-request processing policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOptions {
    /// Stop after the first chunk containing any failure.
    pub fail_fast: bool,
    /// Chunk size; the last chunk may be smaller. Must be at least 1.
    pub batch_size: usize,
    /// Proceed to the next chunk when the current one reports failures.
    /// Ignored when `fail_fast` is set.
    pub continue_on_failure: bool,
    /// Screen the batch for repeated identity keys before processing.
    pub validate_duplicates: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_failure: true,
            validate_duplicates: true,
        }
    }
}

/// Errors raised while constructing a batch request.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum OptionsError {
    /// `batch_size` must be at least 1.
    #[snafu(display("batch_size must be >= 1, got {batch_size}"))]
    InvalidBatchSize {
        /// The rejected batch size.
        batch_size: usize,
    },
}

/// A validated ingestion request: an ordered sequence of raw records plus
/// processing options. Immutable once handed to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchRequest {
    records: Vec<RawRecord>,
    options: BatchOptions,
}

impl BatchRequest {
    /// Build a request, validating the options.
    ///
    /// Size bounds on `records` (1..=1000) and required-field presence are
    /// the transport layer's responsibility and are not re-checked here.
    pub fn new(records: Vec<RawRecord>, options: BatchOptions) -> Result<Self, OptionsError> {
        ensure!(
            options.batch_size >= 1,
            InvalidBatchSizeSnafu {
                batch_size: options.batch_size
            }
        );
        Ok(Self { records, options })
    }

    /// Build a request with default options.
    pub fn with_defaults(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            options: BatchOptions::default(),
        }
    }

    /// Borrow the raw records in request order.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Borrow the processing options.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Decompose into records and options.
    pub(crate) fn into_parts(self) -> (Vec<RawRecord>, BatchOptions) {
        (self.records, self.options)
    }
}
