//! Schema providers.

use std::collections::HashMap;

use super::{EntityDef, FieldDef};
use crate::error::Error;

/// Source of record type descriptions.
///
/// Implemented over whatever storage layer or ORM owns the relation metadata.
pub trait SchemaProvider: Send + Sync {
    /// Describe a record type, or fail with [`Error::UnknownRecordType`].
    fn entity(&self, record_type: &str) -> Result<EntityDef, Error>;

    /// Ordered fields of a record type.
    fn fields(&self, record_type: &str) -> Result<Vec<FieldDef>, Error> {
        Ok(self.entity(record_type)?.fields)
    }
}

/// An in-memory schema.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    entities: HashMap<String, EntityDef>,
}

impl StaticSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record type.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Get a record type by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// List all record type names, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl SchemaProvider for StaticSchema {
    fn entity(&self, record_type: &str) -> Result<EntityDef, Error> {
        self.entities
            .get(record_type)
            .cloned()
            .ok_or_else(|| Error::UnknownRecordType(record_type.to_string()))
    }
}
