//! Top-level batch orchestration.
//!
//! One batch request is one logical unit of sequential work: chunks run in
//! order, one at a time, because a later chunk's eligibility depends on the
//! fail-fast outcome of earlier chunks. Materialization and duplicate
//! detection are pure in-memory steps; only the writer's commit call
//! suspends. Keep new batch-time invariants here so the flow stays
//! centralized.

use std::time::{Duration, Instant};

use chrono::Utc;
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::{
    batch::{
        error::{IngestError, SchemaSnafu},
        options::BatchRequest,
        response::{BatchResponse, FailureDetail, FailureKind},
        stats::StatsAggregator,
    },
    dedup,
    record::materialize::{self, RawRecord},
    schema::cache::{SchemaCache, SchemaSource},
    writer::TableWriter,
};

/// Orchestrates batch ingestion against one table writer and one schema
/// source.
///
/// Independent batch requests may run concurrently through a shared
/// coordinator; they share nothing mutable except the translated-schema
/// cache, which is safe for concurrent reads and idempotent on writes.
pub struct BatchCoordinator<W, S> {
    writer: W,
    schemas: S,
    cache: SchemaCache,
    identity: Box<dedup::IdentityKeyFn>,
}

impl<W, S> BatchCoordinator<W, S>
where
    W: TableWriter,
    S: SchemaSource,
{
    /// Create a coordinator with a domain-defined identity key extractor.
    pub fn new(
        writer: W,
        schemas: S,
        identity: impl Fn(&RawRecord) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            writer,
            schemas,
            cache: SchemaCache::new(),
            identity: Box::new(identity),
        }
    }

    /// Borrow the underlying table writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Process one batch request for `entity_type`.
    ///
    /// Only a schema resolution/translation failure aborts the request;
    /// every other failure is captured per item (or per chunk) in the
    /// response. The response invariant `success_count + failure_count ==
    /// total_requested` always holds: under fail-fast, records in
    /// never-attempted chunks are excluded from the accounting basis.
    pub async fn ingest(
        &self,
        entity_type: &str,
        request: BatchRequest,
    ) -> Result<BatchResponse, IngestError> {
        // 1) Resolve the translated schema (lazily, cached per entity type).
        let schema = self
            .cache
            .get_or_translate(entity_type, &self.schemas)
            .context(SchemaSnafu { entity_type })?;

        let (records, options) = request.into_parts();
        let mut agg = StatsAggregator::new();
        let mut failures: Vec<FailureDetail> = Vec::new();
        let mut successful_ids: Vec<String> = Vec::new();
        let mut success_count: u64 = 0;

        // 2) Duplicate screen, before any write is attempted.
        let mut excluded = vec![false; records.len()];
        if options.validate_duplicates {
            let duplicates = dedup::find_duplicates(&records, self.identity.as_ref());
            agg.set_metric("duplicates_screened", duplicates.len() as u64);
            for index in duplicates {
                excluded[index] = true;
                let id = (self.identity)(&records[index]);
                failures.push(FailureDetail {
                    message: format!(
                        "duplicate identity key{} within batch",
                        id.as_deref()
                            .map(|k| format!(" '{k}'"))
                            .unwrap_or_default()
                    ),
                    id,
                    index,
                    kind: FailureKind::DuplicateKey,
                });
            }
        }

        // 3) Chunk the remaining records, preserving original indices.
        let eligible: Vec<(usize, &RawRecord)> = records
            .iter()
            .enumerate()
            .filter(|(i, _)| !excluded[*i])
            .collect();

        let mut aborted = false;
        for chunk in eligible.chunks(options.batch_size) {
            let mut chunk_has_failure = false;
            let mut typed = Vec::with_capacity(chunk.len());
            let mut typed_indices = Vec::with_capacity(chunk.len());

            // 4) Materialize each record; per-item failures isolate siblings.
            for (index, raw) in chunk {
                match materialize::materialize(raw, &schema) {
                    Ok(record) => {
                        typed.push(record);
                        typed_indices.push(*index);
                    }
                    Err(err) => {
                        chunk_has_failure = true;
                        debug!(index, %err, "record failed materialization");
                        failures.push(FailureDetail {
                            id: (self.identity)(raw),
                            index: *index,
                            message: err.to_string(),
                            kind: FailureKind::Coercion,
                        });
                    }
                }
            }

            // 5) Commit the chunk's valid records as one unit.
            let mut commit_elapsed = Duration::ZERO;
            if !typed.is_empty() {
                let start = Instant::now();
                let outcome = self.writer.commit(&typed).await;
                commit_elapsed = start.elapsed();
                agg.record_commit();

                match outcome {
                    Ok(receipt) => {
                        success_count += typed.len() as u64;
                        successful_ids.extend(receipt.committed_ids);
                        debug!(
                            version = receipt.version,
                            rows = typed.len(),
                            "chunk committed"
                        );
                    }
                    Err(err) => {
                        // Chunk-wide failure: every record in the chunk is
                        // marked failed, distinct from materialization
                        // failures.
                        chunk_has_failure = true;
                        warn!(%err, rows = typed.len(), "chunk commit failed");
                        for index in &typed_indices {
                            failures.push(FailureDetail {
                                id: (self.identity)(&records[*index]),
                                index: *index,
                                message: format!("chunk commit failed: {err}"),
                                kind: FailureKind::StorageCommit,
                            });
                        }
                    }
                }
            }
            agg.record_chunk(commit_elapsed);

            // 6) Fail-fast short-circuit: stop after the first chunk with
            //    any failure. Un-attempted records are not reported at all.
            if chunk_has_failure && (options.fail_fast || !options.continue_on_failure) {
                aborted = true;
                break;
            }
        }

        if aborted {
            agg.set_metric("aborted", true);
        }

        // 7) Aggregate. Failures are re-ordered by original request index
        //    (duplicate failures were recorded before chunk failures).
        failures.sort_by_key(|f| f.index);
        let failure_count = failures.len() as u64;
        let total_requested = success_count + failure_count;
        let (statistics, processing_time_ms) = agg.finish(total_requested);

        Ok(BatchResponse {
            total_requested,
            success_count,
            failure_count,
            successful_ids,
            failures,
            processed_at: Utc::now(),
            processing_time_ms,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        batch::options::BatchOptions,
        dedup::field_identity,
        schema::{
            cache::InMemorySchemaRegistry,
            source::{PrimitiveKind, SourceField, SourceSchemaNode},
        },
        writer::MemoryTableWriter,
    };
    use serde_json::json;

    fn reading_schema() -> SourceSchemaNode {
        SourceSchemaNode::record(vec![
            SourceField {
                name: "id".to_string(),
                node: SourceSchemaNode::Primitive(PrimitiveKind::String),
            },
            SourceField {
                name: "count".to_string(),
                node: SourceSchemaNode::Primitive(PrimitiveKind::Int64),
            },
        ])
        .expect("valid record")
    }

    fn registry() -> InMemorySchemaRegistry {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register("reading", reading_schema());
        registry
    }

    fn coordinator(
        writer: MemoryTableWriter,
    ) -> BatchCoordinator<MemoryTableWriter, InMemorySchemaRegistry> {
        BatchCoordinator::new(writer, registry(), field_identity("id"))
    }

    fn raw(json: serde_json::Value) -> RawRecord {
        json.as_object().expect("object").clone()
    }

    fn records(ids_and_counts: &[(&str, serde_json::Value)]) -> Vec<RawRecord> {
        ids_and_counts
            .iter()
            .map(|(id, count)| raw(json!({"id": id, "count": count})))
            .collect()
    }

    #[tokio::test]
    async fn clean_batch_commits_everything_in_order() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::new(
            records(&[("a", json!(1)), ("b", json!(2)), ("c", json!(3))]),
            BatchOptions {
                batch_size: 2,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 3);
        assert_eq!(response.success_count, 3);
        assert_eq!(response.failure_count, 0);
        assert_eq!(response.successful_ids, vec!["a", "b", "c"]);
        assert!(response.failures.is_empty());
        // Two chunks (2 + 1), one commit each.
        assert_eq!(response.statistics.total_batches, 2);
        assert_eq!(response.statistics.commit_count, 2);
        assert_eq!(response.statistics.avg_batch_size, 1); // 3 / 2 floored
        assert_eq!(coordinator.writer().version(), 2);
        assert_eq!(coordinator.writer().rows().len(), 3);
    }

    #[tokio::test]
    async fn coercion_failure_isolates_siblings() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::with_defaults(records(&[
            ("a", json!(1)),
            ("b", json!("not-a-number")),
            ("c", json!(3)),
        ]));

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 3);
        assert_eq!(response.success_count, 2);
        assert_eq!(response.failure_count, 1);
        assert_eq!(response.successful_ids, vec!["a", "c"]);
        let failure = &response.failures[0];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.id.as_deref(), Some("b"));
        assert_eq!(failure.kind, FailureKind::Coercion);
    }

    #[tokio::test]
    async fn duplicates_are_screened_before_any_write() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::with_defaults(records(&[
            ("a", json!(1)),
            ("b", json!(2)),
            ("a", json!(3)),
        ]));

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 3);
        assert_eq!(response.success_count, 2);
        assert_eq!(response.failure_count, 1);
        let failure = &response.failures[0];
        assert_eq!(failure.index, 2);
        assert_eq!(failure.kind, FailureKind::DuplicateKey);
        // Index 0 proceeded normally; the duplicate row was never committed.
        assert_eq!(response.successful_ids, vec!["a", "b"]);
        assert_eq!(coordinator.writer().rows().len(), 2);
        assert_eq!(
            response
                .statistics
                .additional_metrics
                .get("duplicates_screened"),
            Some(&serde_json::Value::from(1u64))
        );
    }

    #[tokio::test]
    async fn duplicate_screening_can_be_disabled() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::new(
            records(&[("a", json!(1)), ("a", json!(2))]),
            BatchOptions {
                validate_duplicates: false,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.success_count, 2);
        assert_eq!(coordinator.writer().rows().len(), 2);
    }

    #[tokio::test]
    async fn fail_fast_short_circuits_and_shrinks_accounting_basis() {
        // batch_size=2, 4 records, index 1 fails coercion: chunk 1 is
        // attempted (0 succeeds, 1 fails), chunk 2 never runs.
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::new(
            records(&[
                ("a", json!(1)),
                ("b", json!("bad")),
                ("c", json!(3)),
                ("d", json!(4)),
            ]),
            BatchOptions {
                fail_fast: true,
                batch_size: 2,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 2);
        assert_eq!(response.success_count, 1);
        assert_eq!(response.failure_count, 1);
        assert_eq!(response.successful_ids, vec!["a"]);
        assert_eq!(response.failures[0].index, 1);
        assert_eq!(response.statistics.total_batches, 1);
        assert_eq!(
            response.statistics.additional_metrics.get("aborted"),
            Some(&serde_json::Value::Bool(true))
        );
        // Un-attempted records were never committed.
        assert_eq!(coordinator.writer().rows().len(), 1);
    }

    #[tokio::test]
    async fn commit_failure_marks_whole_chunk_failed() {
        let coordinator = coordinator(MemoryTableWriter::new("id").fail_on_attempt(1));
        let request = BatchRequest::new(
            records(&[
                ("a", json!(1)),
                ("b", json!(2)),
                ("c", json!(3)),
                ("d", json!(4)),
            ]),
            BatchOptions {
                batch_size: 2,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 4);
        assert_eq!(response.success_count, 2);
        assert_eq!(response.failure_count, 2);
        assert_eq!(response.successful_ids, vec!["a", "b"]);
        for (failure, expected_index) in response.failures.iter().zip([2usize, 3]) {
            assert_eq!(failure.index, expected_index);
            assert_eq!(failure.kind, FailureKind::StorageCommit);
        }
        // Both chunks were processed; both issued a commit.
        assert_eq!(response.statistics.total_batches, 2);
        assert_eq!(response.statistics.commit_count, 2);
    }

    #[tokio::test]
    async fn continue_on_failure_false_stops_after_failed_chunk() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::new(
            records(&[("a", json!("bad")), ("b", json!(2))]),
            BatchOptions {
                batch_size: 1,
                continue_on_failure: false,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 1);
        assert_eq!(response.success_count, 0);
        assert_eq!(response.failure_count, 1);
        assert_eq!(response.statistics.total_batches, 1);
    }

    #[tokio::test]
    async fn failures_are_ordered_by_original_index() {
        // A duplicate at index 3 and a coercion failure at index 1: the
        // failure list must come back sorted by request position.
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::with_defaults(records(&[
            ("a", json!(1)),
            ("b", json!("bad")),
            ("c", json!(3)),
            ("a", json!(4)),
        ]));

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        let indices: Vec<_> = response.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(response.failures[0].kind, FailureKind::Coercion);
        assert_eq!(response.failures[1].kind, FailureKind::DuplicateKey);
    }

    #[tokio::test]
    async fn unknown_entity_type_is_a_hard_failure() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::with_defaults(records(&[("a", json!(1))]));

        let err = coordinator
            .ingest("ghost", request)
            .await
            .expect_err("unknown entity type");

        assert!(matches!(err, IngestError::Schema { entity_type, .. } if entity_type == "ghost"));
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_response() {
        let coordinator = coordinator(MemoryTableWriter::new("id"));
        let request = BatchRequest::with_defaults(vec![]);

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(response.total_requested, 0);
        assert_eq!(response.success_count, 0);
        assert_eq!(response.failure_count, 0);
        assert_eq!(response.statistics.total_batches, 0);
    }

    #[tokio::test]
    async fn count_invariant_holds_across_mixed_outcomes() {
        let coordinator = coordinator(MemoryTableWriter::new("id").fail_on_attempt(2));
        let request = BatchRequest::new(
            records(&[
                ("a", json!(1)),
                ("a", json!(2)),       // duplicate
                ("b", json!("bad")),   // coercion failure
                ("c", json!(3)),
                ("d", json!(4)),
                ("e", json!(5)),       // chunk whose commit fails
            ]),
            BatchOptions {
                batch_size: 2,
                ..BatchOptions::default()
            },
        )
        .expect("valid request");

        let response = coordinator.ingest("reading", request).await.expect("ingest");

        assert_eq!(
            response.success_count + response.failure_count,
            response.total_requested
        );
        assert_eq!(response.total_requested, 6);
    }
}
