//! Field definitions for record types.

use serde::{Deserialize, Serialize};

/// What a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// A plain column value.
    Scalar,
    /// At most one related record (foreign key or one-to-one).
    Singular,
    /// Any number of related records (reverse foreign key or many-to-many).
    Plural,
    /// A value computed from other stored fields.
    Computed,
}

/// A field of a record type, as seen by the API.
///
/// `name` is the API-facing name. `storage_name` is set when the underlying
/// column or relation is named differently (an API field `fullname` backed
/// by the column `name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// API-facing field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Related record type for singular and plural relations.
    pub target: Option<String>,
    /// Storage-level column or relation name, when different from `name`.
    pub storage_name: Option<String>,
    /// Foreign key column on this record backing a singular relation.
    pub foreign_key: Option<String>,
    /// Storage paths a computed field reads.
    pub depends_on: Vec<String>,
    /// Accepted on input but never written to responses.
    pub write_only: bool,
}

impl FieldDef {
    fn with_kind(name: impl Into<String>, kind: FieldKind, target: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target,
            storage_name: None,
            foreign_key: None,
            depends_on: Vec::new(),
            write_only: false,
        }
    }

    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Scalar, None)
    }

    /// Create a singular relation to `target`.
    pub fn singular(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Singular, Some(target.into()))
    }

    /// Create a plural relation to `target`.
    pub fn plural(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Plural, Some(target.into()))
    }

    /// Create a computed field reading the given storage paths.
    pub fn computed<I, S>(name: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut field = Self::with_kind(name, FieldKind::Computed, None);
        field.depends_on = depends_on.into_iter().map(Into::into).collect();
        field
    }

    /// Back this field with a differently named storage column or relation.
    pub fn stored_as(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    /// Set the foreign key column of a singular relation.
    pub fn with_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Mark as write-only.
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Storage-level name.
    pub fn storage_name(&self) -> &str {
        self.storage_name.as_deref().unwrap_or(&self.name)
    }

    /// Check if this field is a relation.
    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Singular | FieldKind::Plural)
    }

    /// Check if this field is backed by a column of its own record.
    pub fn is_column(&self) -> bool {
        self.kind == FieldKind::Scalar
    }

    /// Check if this field appears in responses.
    pub fn is_readable(&self) -> bool {
        !self.write_only
    }
}
