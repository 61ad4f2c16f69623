//! Per-entity-type cache of translated schemas.
//!
//! Translation is deterministic and side-effect-free, so caching is always
//! safe: concurrent translations of the same entity type may race, but they
//! produce identical results and the first write wins. Readers share the
//! cached schema through an `Arc`.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::schema::{
    source::SourceSchemaNode,
    target::TargetSchema,
    translate::{self, SchemaError},
};

/// Supplies the source schema for a given entity type.
///
/// Schema registration and versioning live outside the core; this trait is
/// the boundary through which the ingestion pipeline resolves schemas (for
/// example, from a registry keyed by entity-type name).
pub trait SchemaSource: Send + Sync {
    /// Resolve the source schema for `entity_type`.
    ///
    /// Returns [`SchemaError::UnknownEntityType`] when no schema is
    /// registered under that name.
    fn source_schema(&self, entity_type: &str) -> Result<SourceSchemaNode, SchemaError>;
}

/// Simple in-memory [`SchemaSource`] backed by a name → schema map.
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistry {
    schemas: HashMap<String, SourceSchemaNode>,
}

impl InMemorySchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the schema for an entity type.
    pub fn register(&mut self, entity_type: impl Into<String>, schema: SourceSchemaNode) {
        self.schemas.insert(entity_type.into(), schema);
    }
}

impl SchemaSource for InMemorySchemaRegistry {
    fn source_schema(&self, entity_type: &str) -> Result<SourceSchemaNode, SchemaError> {
        self.schemas.get(entity_type).cloned().ok_or_else(|| {
            SchemaError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            }
        })
    }
}

/// Concurrent-read cache of translated schemas, keyed by entity type.
#[derive(Debug, Default)]
pub struct SchemaCache {
    translated: RwLock<HashMap<String, Arc<TargetSchema>>>,
}

impl SchemaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the translated schema for `entity_type`, translating (and
    /// caching) it on first use.
    ///
    /// The write is idempotent: if another caller translated the same entity
    /// type concurrently, the already-cached schema is kept and returned.
    pub fn get_or_translate(
        &self,
        entity_type: &str,
        source: &dyn SchemaSource,
    ) -> Result<Arc<TargetSchema>, SchemaError> {
        if let Ok(cache) = self.translated.read() {
            if let Some(schema) = cache.get(entity_type) {
                return Ok(Arc::clone(schema));
            }
        }

        let source_schema = source.source_schema(entity_type)?;
        let translated = Arc::new(translate::translate(&source_schema)?);

        let mut cache = match self.translated.write() {
            Ok(guard) => guard,
            // A poisoned lock only means another thread panicked mid-insert;
            // the map itself is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = cache
            .entry(entity_type.to_string())
            .or_insert_with(|| Arc::clone(&translated));
        Ok(Arc::clone(entry))
    }

    /// Number of entity types with a cached translation.
    pub fn len(&self) -> usize {
        self.translated.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::source::{PrimitiveKind, SourceField};

    fn sample_record() -> SourceSchemaNode {
        SourceSchemaNode::record(vec![SourceField {
            name: "id".to_string(),
            node: SourceSchemaNode::Primitive(PrimitiveKind::String),
        }])
        .expect("valid record")
    }

    #[test]
    fn registry_resolves_registered_schema() {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register("sensor", sample_record());

        let schema = registry.source_schema("sensor").expect("registered");
        assert_eq!(schema, sample_record());
    }

    #[test]
    fn registry_rejects_unknown_entity_type() {
        let registry = InMemorySchemaRegistry::new();
        let err = registry.source_schema("ghost").unwrap_err();
        assert!(
            matches!(err, SchemaError::UnknownEntityType { entity_type } if entity_type == "ghost")
        );
    }

    #[test]
    fn cache_translates_once_and_shares() {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register("sensor", sample_record());
        let cache = SchemaCache::new();

        let first = cache
            .get_or_translate("sensor", &registry)
            .expect("translate");
        let second = cache
            .get_or_translate("sensor", &registry)
            .expect("cached");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_propagates_translation_errors_without_caching() {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register(
            "bare",
            SourceSchemaNode::Primitive(PrimitiveKind::Int64),
        );
        let cache = SchemaCache::new();

        let err = cache.get_or_translate("bare", &registry).unwrap_err();
        assert!(matches!(err, SchemaError::NotARecord { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_translations_are_idempotent() {
        let mut registry = InMemorySchemaRegistry::new();
        registry.register("sensor", sample_record());
        let registry = Arc::new(registry);
        let cache = Arc::new(SchemaCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    cache
                        .get_or_translate("sensor", registry.as_ref())
                        .expect("translate")
                })
            })
            .collect();

        let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for schema in &schemas[1..] {
            assert_eq!(schema.as_ref(), schemas[0].as_ref());
        }
        assert_eq!(cache.len(), 1);
    }
}
