//! returnfields core - field restriction and fetch-plan optimization.
//!
//! Clients name the fields they want (`return_fields=id,skills__name`) or the
//! ones they do not (`skip_fields=content`). This crate prunes response
//! documents to match, level by level, and can narrow the query behind a
//! response to the columns and joins those fields need.

pub mod catalog;
pub mod config;
pub mod error;
pub mod plan;
pub mod restrict;
pub mod serialize;

pub use catalog::{
    EntityDef, EntityDescriptor, FieldDef, FieldKind, SchemaIndex, SchemaProvider, StaticSchema,
};
pub use config::RestrictionConfig;
pub use error::Error;
pub use plan::{FetchPlan, FetchPlanner, FetchQuery, HintExtractor, HintTree, NameTranslator};
pub use restrict::{Activation, Frame, FrameStack, OptimizeMode, PathSet, RestrictionEngine};
pub use serialize::{
    DynamicRecord, FieldRef, Record, RegistryStats, RestrictedSerializer, SerializationEngine,
    SerializerRegistry, Session,
};

// Wire types used throughout the public API.
pub use returnfields_proto::{Document, FieldPath, Node, ParamSource, QueryParams, QuerySpec, Value};
