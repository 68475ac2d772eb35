//! Records as seen by the serializer.

use std::collections::HashMap;

use returnfields_proto::Value;

/// The content of one field of a record.
pub enum FieldRef<'a> {
    /// A scalar or computed value.
    Value(Value),
    /// A singular relation, `None` when empty.
    One(Option<&'a dyn Record>),
    /// A plural relation.
    Many(Vec<&'a dyn Record>),
}

/// A record that can be walked by API field name.
pub trait Record {
    /// Record type name, as known to the schema.
    fn record_type(&self) -> &str;

    /// Read a field by API name. `None` if the record does not carry it.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Value),
    One(Option<Box<DynamicRecord>>),
    Many(Vec<DynamicRecord>),
}

/// A record assembled at runtime from named values.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    record_type: String,
    slots: HashMap<String, Slot>,
}

impl DynamicRecord {
    /// Create an empty record of `record_type`.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            slots: HashMap::new(),
        }
    }

    /// Set a scalar value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(name.into(), Slot::Value(value.into()));
        self
    }

    /// Set a singular relation.
    pub fn with_one(mut self, name: impl Into<String>, related: Option<DynamicRecord>) -> Self {
        self.slots
            .insert(name.into(), Slot::One(related.map(Box::new)));
        self
    }

    /// Set a plural relation.
    pub fn with_many(mut self, name: impl Into<String>, related: Vec<DynamicRecord>) -> Self {
        self.slots.insert(name.into(), Slot::Many(related));
        self
    }

    /// Check if a field is set.
    pub fn has_field(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

impl Record for DynamicRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let field = match self.slots.get(name)? {
            Slot::Value(value) => FieldRef::Value(value.clone()),
            Slot::One(related) => FieldRef::One(related.as_deref().map(|r| r as &dyn Record)),
            Slot::Many(related) => {
                FieldRef::Many(related.iter().map(|r| r as &dyn Record).collect())
            }
        };
        Some(field)
    }
}
