//! Core engine for ingesting structured record batches into a versioned,
//! transactional table store.
//!
//! This crate provides the foundational pieces for `record-table-sink`:
//!
//! - A schema translation engine that maps a self-describing, tagged-union
//!   source schema (records, arrays, maps, enums, nullable unions) into the
//!   flat, strictly-typed column schema accepted by the storage layer
//!   (`schema` module).
//! - A record materializer that coerces untyped field maps into typed rows
//!   conforming to a translated schema (`record` module).
//! - Duplicate detection over identity keys within a batch (`dedup` module).
//! - A batch coordinator that chunks large requests, isolates per-item
//!   failures, applies fail-fast vs. continue policies, and aggregates
//!   per-chunk timing statistics into a response (`batch` module).
//! - The narrow `TableWriter` commit boundary behind which the transactional
//!   table store lives (`writer` module).
//!
//! Transport, request validation, and the storage engine itself are external
//! collaborators; this crate owns only the data and control contracts at
//! those boundaries.
#![deny(missing_docs)]
pub mod batch;
pub mod dedup;
pub mod record;
pub mod schema;
pub mod writer;
