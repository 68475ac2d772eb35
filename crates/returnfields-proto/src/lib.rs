//! returnfields wire types.
//!
//! This crate defines the types exchanged at the edges of the restriction
//! engine: the request parameters it reads, the field paths clients send, the
//! query descriptions it rewrites, and the response documents it produces.
//!
//! # Modules
//!
//! - [`path`] - `__`-joined field paths
//! - [`params`] - request parameter access
//! - [`query`] - in-memory fetch descriptions
//! - [`value`] - scalar values
//! - [`result`] - key-ordered response documents
//! - [`error`] - protocol error types

pub mod error;
pub mod params;
pub mod path;
pub mod query;
pub mod result;
pub mod value;

pub use error::Error;

pub use params::{ParamSource, QueryParams};
pub use path::{FieldPath, PATH_SEPARATOR};
pub use query::{FilterExpr, OrderDirection, OrderSpec, QuerySpec};
pub use result::{Document, Node};
pub use value::Value;
