//! Batch response model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::stats::BatchStatistics;

/// Classification of a recorded per-item or per-chunk failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    /// The record's identity key repeated an earlier record in the batch;
    /// detected before any write attempt.
    DuplicateKey,
    /// A raw value could not be coerced to its column type.
    Coercion,
    /// The chunk-level commit failed; every record in the chunk carries
    /// this kind.
    StorageCommit,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::DuplicateKey => write!(f, "duplicate_key"),
            FailureKind::Coercion => write!(f, "coercion"),
            FailureKind::StorageCommit => write!(f, "storage_commit"),
        }
    }
}

/// One recorded failure, with enough context to retry just the failed
/// subset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureDetail {
    /// Identity key of the record, when one could be extracted.
    pub id: Option<String>,
    /// Position in the original request (not the chunk).
    pub index: usize,
    /// Human-readable failure message.
    pub message: String,
    /// Failure classification.
    pub kind: FailureKind,
}

/// Aggregated outcome of one batch request. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchResponse {
    /// Count of records actually evaluated for success or failure.
    ///
    /// Under fail-fast this is the records attempted, not the records
    /// submitted: a batch aborted mid-way excludes never-attempted records
    /// entirely, so `success_count + failure_count == total_requested`
    /// holds unconditionally.
    pub total_requested: u64,
    /// Number of records committed successfully.
    pub success_count: u64,
    /// Number of records with a recorded failure.
    pub failure_count: u64,
    /// Identities of committed records, in original request order.
    pub successful_ids: Vec<String>,
    /// Recorded failures, ordered by original request index.
    pub failures: Vec<FailureDetail>,
    /// When the response was produced.
    pub processed_at: DateTime<Utc>,
    /// Total wall-clock time spent processing the request, in milliseconds.
    pub processing_time_ms: u64,
    /// Per-chunk timing and count aggregation.
    pub statistics: BatchStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_display_is_stable() {
        assert_eq!(FailureKind::DuplicateKey.to_string(), "duplicate_key");
        assert_eq!(FailureKind::Coercion.to_string(), "coercion");
        assert_eq!(FailureKind::StorageCommit.to_string(), "storage_commit");
    }

    #[test]
    fn response_json_roundtrip() {
        let response = BatchResponse {
            total_requested: 2,
            success_count: 1,
            failure_count: 1,
            successful_ids: vec!["a".to_string()],
            failures: vec![FailureDetail {
                id: Some("b".to_string()),
                index: 1,
                message: "invalid value".to_string(),
                kind: FailureKind::Coercion,
            }],
            processed_at: Utc::now(),
            processing_time_ms: 12,
            statistics: BatchStatistics::default(),
        };

        let json = serde_json::to_string(&response).unwrap();
        let back: BatchResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
