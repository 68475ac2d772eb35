//! Schema catalog for record types.
//!
//! The catalog describes, per record type, which fields exist, whether they
//! are scalars, singular relations, plural relations or computed values, and
//! which storage-level names back them. Descriptors are obtained from a
//! [`SchemaProvider`] and memoized by the [`SchemaIndex`].

mod entity;
mod field;
mod index;
mod schema;

pub use entity::EntityDef;
pub use field::{FieldDef, FieldKind};
pub use index::{EntityDescriptor, SchemaIndex};
pub use schema::{SchemaProvider, StaticSchema};
