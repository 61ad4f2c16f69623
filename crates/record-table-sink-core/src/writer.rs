//! The table-writer commit boundary.
//!
//! The transactional table store lives behind [`TableWriter`]: a single
//! atomic, all-or-nothing commit operation covering one chunk's typed rows.
//! The writer provides its own serialization/isolation guarantees for
//! concurrent commits; the core never retries a failed commit itself.
//!
//! [`MemoryTableWriter`] is an in-memory, versioned implementation used by
//! tests and examples.

use std::sync::Mutex;

use snafu::prelude::*;

use crate::record::value::TypedRecord;

/// Outcome of a successful chunk commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Table version created by this commit.
    pub version: u64,
    /// Identities of the committed rows, in commit order.
    pub committed_ids: Vec<String>,
}

/// Errors signalled by the table writer.
///
/// Distinguishable from materialization errors: any variant here marks the
/// whole chunk failed, not individual records.
#[derive(Debug, Snafu)]
pub enum CommitError {
    /// Another writer advanced the table version first.
    #[snafu(display("Version conflict: expected {expected}, found {found}"))]
    Conflict {
        /// Version the commit was based on.
        expected: u64,
        /// Version actually found at commit time.
        found: u64,
    },

    /// I/O failure in the underlying store.
    #[snafu(display("Storage I/O error during commit: {source}"))]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The writer rejected the chunk for a store-specific reason.
    #[snafu(display("Commit rejected: {reason}"))]
    Rejected {
        /// Store-specific rejection reason.
        reason: String,
    },
}

/// Atomic "commit these typed rows" contract exposed by the table store.
pub trait TableWriter {
    /// Commit one chunk of typed rows as a single unit.
    ///
    /// Either every row in `records` becomes durable under a new table
    /// version, or none do and an error is returned.
    fn commit(
        &self,
        records: &[TypedRecord],
    ) -> impl std::future::Future<Output = Result<CommitReceipt, CommitError>> + Send;
}

#[derive(Debug, Default)]
struct MemoryTableState {
    version: u64,
    rows: Vec<TypedRecord>,
    commits_attempted: u64,
}

/// In-memory [`TableWriter`] with a version counter.
///
/// Row identities are reported from the configured identity column, falling
/// back to the row's overall position when the column is null or absent.
/// A failure can be injected on a specific commit attempt to exercise
/// chunk-wide failure paths.
#[derive(Debug)]
pub struct MemoryTableWriter {
    identity_field: String,
    fail_on_attempt: Option<u64>,
    state: Mutex<MemoryTableState>,
}

impl MemoryTableWriter {
    /// Create a writer that reports identities from `identity_field`.
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            fail_on_attempt: None,
            state: Mutex::new(MemoryTableState::default()),
        }
    }

    /// Make the `attempt`-th commit call (0-based) fail with a version
    /// conflict instead of committing.
    pub fn fail_on_attempt(mut self, attempt: u64) -> Self {
        self.fail_on_attempt = Some(attempt);
        self
    }

    /// Current table version (number of successful commits).
    pub fn version(&self) -> u64 {
        self.lock_state().version
    }

    /// Snapshot of every committed row, in commit order.
    pub fn rows(&self) -> Vec<TypedRecord> {
        self.lock_state().rows.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MemoryTableState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TableWriter for MemoryTableWriter {
    async fn commit(&self, records: &[TypedRecord]) -> Result<CommitReceipt, CommitError> {
        let mut state = self.lock_state();

        let attempt = state.commits_attempted;
        state.commits_attempted += 1;
        if self.fail_on_attempt == Some(attempt) {
            return ConflictSnafu {
                expected: state.version,
                found: state.version + 1,
            }
            .fail();
        }

        let base = state.rows.len();
        let committed_ids = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                record
                    .get(&self.identity_field)
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_text())
                    .unwrap_or_else(|| (base + i).to_string())
            })
            .collect();

        state.rows.extend_from_slice(records);
        state.version += 1;

        Ok(CommitReceipt {
            version: state.version,
            committed_ids,
        })
    }
}
