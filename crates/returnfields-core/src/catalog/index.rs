//! Memoized record type descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::{EntityDef, FieldDef, SchemaProvider};

/// Lookup structure for one record type.
///
/// Fields are addressable both by API name and by storage name; the field
/// order of the underlying [`EntityDef`] is kept.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    def: EntityDef,
    by_name: HashMap<String, usize>,
    by_storage: HashMap<String, usize>,
}

impl EntityDescriptor {
    /// Build a descriptor from a definition.
    pub fn new(def: EntityDef) -> Self {
        let mut by_name = HashMap::with_capacity(def.fields.len());
        let mut by_storage = HashMap::with_capacity(def.fields.len());
        for (i, field) in def.fields.iter().enumerate() {
            by_name.entry(field.name.clone()).or_insert(i);
            by_storage.entry(field.storage_name().to_string()).or_insert(i);
        }
        Self {
            def,
            by_name,
            by_storage,
        }
    }

    /// Descriptor with no fields, used for types the provider cannot describe.
    pub fn empty(record_type: impl Into<String>) -> Self {
        Self::new(EntityDef::new(record_type, ""))
    }

    /// Record type name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Storage name of the identity column (empty for unknown types).
    pub fn identity_field(&self) -> &str {
        &self.def.identity_field
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.def.fields
    }

    /// Fields that appear in responses, in declaration order.
    pub fn readable_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.def.fields.iter().filter(|f| f.is_readable())
    }

    /// Names of readable fields, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.readable_fields().map(|f| f.name.as_str()).collect()
    }

    /// Look up a field by API name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.def.fields[i])
    }

    /// Look up a field by storage name.
    pub fn get_by_storage(&self, storage_name: &str) -> Option<&FieldDef> {
        self.by_storage.get(storage_name).map(|&i| &self.def.fields[i])
    }

    /// Check if the descriptor has no fields.
    pub fn is_empty(&self) -> bool {
        self.def.fields.is_empty()
    }
}

/// Per record type cache of [`EntityDescriptor`]s.
///
/// Descriptors are built on first use and never change afterwards. Lookups
/// from concurrent requests only contend on the shard holding the type.
pub struct SchemaIndex {
    provider: Arc<dyn SchemaProvider>,
    cache: DashMap<String, Arc<EntityDescriptor>>,
}

impl SchemaIndex {
    /// Create an index over a provider.
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
        }
    }

    /// Create an index owning its provider.
    pub fn from_provider(provider: impl SchemaProvider + 'static) -> Self {
        Self::new(Arc::new(provider))
    }

    /// Describe a record type.
    ///
    /// Never fails: a type the provider cannot describe yields an empty
    /// descriptor, so every path into it is treated as unmatched. Failures are
    /// not memoized.
    pub fn describe(&self, record_type: &str) -> Arc<EntityDescriptor> {
        if let Some(found) = self.cache.get(record_type) {
            return Arc::clone(found.value());
        }

        match self.provider.entity(record_type) {
            Ok(def) => {
                debug!(record_type, fields = def.fields.len(), "indexed record type");
                let built = Arc::new(EntityDescriptor::new(def));
                // A racing builder may have won; keep whichever landed first.
                let entry = self
                    .cache
                    .entry(record_type.to_string())
                    .or_insert(built);
                Arc::clone(entry.value())
            }
            Err(err) => {
                warn!(record_type, error = %err, "schema lookup failed, using empty descriptor");
                Arc::new(EntityDescriptor::empty(record_type))
            }
        }
    }

    /// Describe the target type of the relation stored as `storage_name` on
    /// `record_type`.
    pub fn describe_target(&self, record_type: &str, storage_name: &str) -> Option<Arc<EntityDescriptor>> {
        let parent = self.describe(record_type);
        let target = parent.get_by_storage(storage_name)?.target.clone()?;
        Some(self.describe(&target))
    }

    /// Number of memoized record types.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl std::fmt::Debug for SchemaIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaIndex")
            .field("cached", &self.cache.len())
            .finish()
    }
}
