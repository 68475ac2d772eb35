//! Restriction-aware serializers and their registry.
//!
//! A [`RestrictedSerializer`] wraps the field list of one record type with a
//! [`RestrictionEngine`]. It is built once per (record type, configuration)
//! pair and shared from the [`SerializerRegistry`] afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::catalog::{EntityDescriptor, SchemaIndex};
use crate::config::RestrictionConfig;
use crate::restrict::{Frame, RestrictionEngine};

/// Serializer for one record type under one restriction configuration.
#[derive(Debug)]
pub struct RestrictedSerializer {
    descriptor: Arc<EntityDescriptor>,
    engine: RestrictionEngine,
    field_names: Vec<String>,
}

impl RestrictedSerializer {
    /// Wrap the readable fields of `descriptor`.
    pub fn new(descriptor: Arc<EntityDescriptor>, engine: RestrictionEngine) -> Self {
        let field_names = descriptor
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            descriptor,
            engine,
            field_names,
        }
    }

    /// Record type served.
    pub fn record_type(&self) -> &str {
        self.descriptor.name()
    }

    /// Schema descriptor of the record type.
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// The restriction engine in use.
    pub fn engine(&self) -> &RestrictionEngine {
        &self.engine
    }

    /// Every readable field, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.field_names.iter().map(String::as_str).collect()
    }

    /// Fields to write for a record under `frame`; all of them when
    /// restriction is inactive.
    pub fn select(&self, frame: Option<&Frame>) -> Vec<&str> {
        let names = self.field_names();
        match frame {
            Some(frame) => self.engine.prune_fields(frame, &names),
            None => names,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistryKey {
    record_type: String,
    config: RestrictionConfig,
}

/// Registry statistics.
#[derive(Debug, Default)]
pub struct RegistryStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RegistryStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Shared cache of [`RestrictedSerializer`]s keyed by record type and
/// configuration.
///
/// Entries are immutable once built; concurrent first lookups of the same key
/// may both build, and the first insert wins.
pub struct SerializerRegistry {
    index: Arc<SchemaIndex>,
    entries: RwLock<HashMap<RegistryKey, Arc<RestrictedSerializer>>>,
    stats: RegistryStats,
}

impl SerializerRegistry {
    /// Create an empty registry over a schema index.
    pub fn new(index: Arc<SchemaIndex>) -> Self {
        Self {
            index,
            entries: RwLock::new(HashMap::new()),
            stats: RegistryStats::default(),
        }
    }

    /// The schema index serializers are built from.
    pub fn index(&self) -> &Arc<SchemaIndex> {
        &self.index
    }

    /// Get or build the serializer for `record_type` under `engine`'s
    /// configuration.
    pub fn get(&self, record_type: &str, engine: &RestrictionEngine) -> Arc<RestrictedSerializer> {
        let key = RegistryKey {
            record_type: record_type.to_string(),
            config: engine.config().clone(),
        };

        if let Some(found) = self.entries.read().get(&key) {
            self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
            trace!(record_type, "restricted serializer cache hit");
            return Arc::clone(found);
        }

        self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(record_type, "building restricted serializer");
        let built = Arc::new(RestrictedSerializer::new(
            self.index.describe(record_type),
            engine.clone(),
        ));
        // Unknown types may be registered later; keep them out of the cache.
        if built.descriptor().is_empty() {
            return built;
        }
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert(built))
    }

    /// Get registry statistics.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Number of cached serializers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached serializer.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("entries", &self.len())
            .field("hits", &self.stats.hits())
            .field("misses", &self.stats.misses())
            .finish()
    }
}
