//! Restricted serialization of record graphs.
//!
//! A [`Session`] covers one response. It activates restriction once, may
//! optimize the underlying query once, and then walks records depth first,
//! pushing a frame on every relation it enters and popping it on the way out.

use std::sync::Arc;

use returnfields_proto::{Document, Node, ParamSource};
use tracing::{debug, instrument};

use super::record::{FieldRef, Record};
use super::registry::SerializerRegistry;
use crate::catalog::SchemaIndex;
use crate::config::RestrictionConfig;
use crate::error::Error;
use crate::plan::{FetchPlan, FetchPlanner, FetchQuery};
use crate::restrict::{Activation, Frame, FrameStack, OptimizeMode, RestrictionEngine};

/// Serializes records through a restriction engine.
///
/// Engines are cheap to create: the registry and planner can be shared
/// between engines that use different configurations over the same schema.
#[derive(Debug)]
pub struct SerializationEngine {
    restriction: RestrictionEngine,
    registry: Arc<SerializerRegistry>,
    planner: Arc<FetchPlanner>,
}

impl SerializationEngine {
    /// Create an engine with its own registry and planner.
    pub fn new(index: Arc<SchemaIndex>, config: RestrictionConfig) -> Result<Self, Error> {
        Ok(Self {
            restriction: RestrictionEngine::new(config)?,
            registry: Arc::new(SerializerRegistry::new(Arc::clone(&index))),
            planner: Arc::new(FetchPlanner::new(index)),
        })
    }

    /// Engine over the standard configuration.
    pub fn standard(index: Arc<SchemaIndex>) -> Self {
        Self {
            restriction: RestrictionEngine::standard(),
            registry: Arc::new(SerializerRegistry::new(Arc::clone(&index))),
            planner: Arc::new(FetchPlanner::new(index)),
        }
    }

    /// Share a serializer registry.
    pub fn with_registry(mut self, registry: Arc<SerializerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Share a fetch planner.
    pub fn with_planner(mut self, planner: Arc<FetchPlanner>) -> Self {
        self.planner = planner;
        self
    }

    /// The restriction engine.
    pub fn restriction(&self) -> &RestrictionEngine {
        &self.restriction
    }

    /// The serializer registry.
    pub fn registry(&self) -> &Arc<SerializerRegistry> {
        &self.registry
    }

    /// The fetch planner.
    pub fn planner(&self) -> &Arc<FetchPlanner> {
        &self.planner
    }

    /// Start a response for records of `record_type`.
    #[instrument(skip(self, params))]
    pub fn begin(&self, record_type: &str, params: &dyn ParamSource) -> Session<'_> {
        let activation = self.restriction.activate(record_type, params);
        Session {
            engine: self,
            record_type: record_type.to_string(),
            activation,
            optimized: false,
        }
    }

    /// Serialize a single record as its own response.
    pub fn serialize(&self, record: &dyn Record, params: &dyn ParamSource) -> Document {
        self.begin(record.record_type(), params).serialize(record)
    }
}

/// Restriction state of one response.
#[derive(Debug)]
pub struct Session<'e> {
    engine: &'e SerializationEngine,
    record_type: String,
    activation: Option<Activation>,
    optimized: bool,
}

impl Session<'_> {
    /// Root record type of the response.
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Check if restriction is active for this response.
    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }

    /// The activation, when active.
    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }

    /// The top-level frame, when active.
    pub fn top_frame(&self) -> Option<&Frame> {
        self.activation.as_ref().map(|a| &a.frame)
    }

    /// Optimize the query feeding this response.
    ///
    /// Runs only when restriction is active, aggressive optimization was
    /// requested and there is something to narrow, and only once per
    /// session. Returns the applied plan.
    #[instrument(skip_all, fields(record_type = %self.record_type))]
    pub fn optimize(&mut self, query: &mut dyn FetchQuery) -> Option<FetchPlan> {
        let activation = self.activation.as_ref()?;
        if !activation.aggressive || activation.mode == OptimizeMode::None {
            return None;
        }
        if self.optimized {
            debug!("query already optimized for this response");
            return None;
        }

        let plan = self.engine.planner.optimize(
            query,
            &self.record_type,
            &activation.frame.include,
            &activation.frame.exclude,
        );
        plan.apply(query);
        self.optimized = true;
        Some(plan)
    }

    /// Optimize, then hand the narrowed query to `hook` for final adjustments.
    ///
    /// The hook runs only when a plan was applied.
    pub fn optimize_with<F>(&mut self, query: &mut dyn FetchQuery, hook: F) -> Option<FetchPlan>
    where
        F: FnOnce(&mut dyn FetchQuery),
    {
        let plan = self.optimize(query)?;
        hook(query);
        Some(plan)
    }

    /// Serialize one record.
    pub fn serialize(&self, record: &dyn Record) -> Document {
        let mut stack = self.top_frame().cloned().map(FrameStack::new);
        self.write_record(record, stack.as_mut())
    }

    /// Serialize a collection; the same top-level frame serves every element.
    pub fn serialize_many(&self, records: &[&dyn Record]) -> Vec<Document> {
        let mut stack = self.top_frame().cloned().map(FrameStack::new);
        records
            .iter()
            .map(|record| self.write_record(*record, stack.as_mut()))
            .collect()
    }

    fn write_record(&self, record: &dyn Record, mut stack: Option<&mut FrameStack>) -> Document {
        let serializer = self
            .engine
            .registry
            .get(record.record_type(), &self.engine.restriction);
        let selected = serializer.select(stack.as_deref().map(FrameStack::current));

        let mut doc = Document::new();
        for name in selected {
            let Some(field) = record.field(name) else {
                debug!(record_type = record.record_type(), field = name, "record does not carry field");
                continue;
            };

            let node = match field {
                FieldRef::Value(value) => Node::Value(value),
                FieldRef::One(related) => {
                    enter(&mut stack, name);
                    let node = Node::Object(
                        related.map(|r| self.write_record(r, stack.as_deref_mut())),
                    );
                    leave(&mut stack);
                    node
                }
                FieldRef::Many(related) => {
                    enter(&mut stack, name);
                    let docs = related
                        .into_iter()
                        .map(|r| self.write_record(r, stack.as_deref_mut()))
                        .collect();
                    leave(&mut stack);
                    Node::List(docs)
                }
            };
            doc.insert(name, node);
        }
        doc
    }
}

fn enter(stack: &mut Option<&mut FrameStack>, field: &str) {
    if let Some(stack) = stack.as_deref_mut() {
        stack.push(field);
    }
}

fn leave(stack: &mut Option<&mut FrameStack>) {
    if let Some(stack) = stack.as_deref_mut() {
        stack.pop();
    }
}
