//! Per-chunk timing and count aggregation.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Aggregated statistics over one batch request.
///
/// Both averages use floor (integer) division; zero processed chunks yields
/// zero averages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchStatistics {
    /// Number of chunks processed.
    pub total_batches: u64,
    /// `total_requested / total_batches`, floor division.
    pub avg_batch_size: u64,
    /// Accumulated commit wall time divided by `total_batches`, floor
    /// division, in milliseconds.
    pub avg_processing_time_per_batch_ms: u64,
    /// Total wall-clock time spent inside writer commits, in milliseconds.
    pub total_commit_time_ms: u64,
    /// Number of commit calls issued to the writer.
    pub commit_count: u64,
    /// Free-form supplementary metrics.
    pub additional_metrics: BTreeMap<String, Json>,
}

/// Accumulates per-chunk outcomes into a [`BatchStatistics`].
///
/// Starts the request-level timer on construction; `finish` computes the
/// derived averages.
#[derive(Debug)]
pub struct StatsAggregator {
    start: Instant,
    total_batches: u64,
    commit_time: Duration,
    commit_count: u64,
    metrics: BTreeMap<String, Json>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    /// Create an aggregator and start the request timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            total_batches: 0,
            commit_time: Duration::ZERO,
            commit_count: 0,
            metrics: BTreeMap::new(),
        }
    }

    /// Record one processed chunk and the wall time of its commit call
    /// (zero when the chunk had no commit, e.g. every record failed
    /// materialization).
    pub fn record_chunk(&mut self, commit_elapsed: Duration) {
        self.total_batches += 1;
        self.commit_time += commit_elapsed;
    }

    /// Record one commit call issued to the writer.
    pub fn record_commit(&mut self) {
        self.commit_count += 1;
    }

    /// Set or replace a supplementary metric.
    pub fn set_metric(&mut self, key: &str, value: impl Into<Json>) {
        self.metrics.insert(key.to_string(), value.into());
    }

    /// Finalize: returns the statistics and the total request wall time in
    /// milliseconds.
    pub fn finish(self, total_requested: u64) -> (BatchStatistics, u64) {
        let total_commit_ms = u64::try_from(self.commit_time.as_millis()).unwrap_or(u64::MAX);
        let stats = BatchStatistics {
            total_batches: self.total_batches,
            avg_batch_size: checked_div(total_requested, self.total_batches),
            avg_processing_time_per_batch_ms: checked_div(total_commit_ms, self.total_batches),
            total_commit_time_ms: total_commit_ms,
            commit_count: self.commit_count,
            additional_metrics: self.metrics,
        };
        let total_ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        (stats, total_ms)
    }
}

fn checked_div(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        0
    } else {
        numerator / denominator
    }
}
