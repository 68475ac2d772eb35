//! Restricted serialization.

mod engine;
mod record;
mod registry;

pub use engine::{SerializationEngine, Session};
pub use record::{DynamicRecord, FieldRef, Record};
pub use registry::{RegistryStats, RestrictedSerializer, SerializerRegistry};
