//! Duplicate detection over identity keys within a batch.
//!
//! Detection runs before any chunk is dispatched to storage: duplicates are
//! reported as failures without attempting a write. The identity key is
//! domain-defined (for example a primary-id field) and extracted by a
//! caller-supplied closure.

use std::collections::HashSet;

use crate::record::materialize::RawRecord;

/// Extracts the identity key from a raw record, if one is present.
pub type IdentityKeyFn = dyn Fn(&RawRecord) -> Option<String> + Send + Sync;

/// Identity extractor that reads a single named field, normalized to its
/// string form (numbers and bools stringify; null and missing yield none).
pub fn field_identity(field: &str) -> impl Fn(&RawRecord) -> Option<String> + Send + Sync {
    let field = field.to_string();
    move |record: &RawRecord| match record.get(&field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Scan `records` in order and return the indices of every record whose
/// identity key was already seen earlier in the same batch.
///
/// The first occurrence of a key is never reported; only subsequent repeats
/// are. Records with no extractable key are never duplicates.
pub fn find_duplicates(records: &[RawRecord], extract: &IdentityKeyFn) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(key) = extract(record) else {
            continue;
        };
        if !seen.insert(key) {
            duplicates.push(index);
        }
    }
    duplicates
}
