//! Fetch planning: narrowing a query to what the response needs.

use std::collections::BTreeSet;
use std::sync::Arc;

use returnfields_proto::{FieldPath, PATH_SEPARATOR};
use tracing::{debug, instrument};

use super::hints::HintExtractor;
use super::query::FetchQuery;
use super::translate::NameTranslator;
use super::FetchPlan;
use crate::catalog::SchemaIndex;
use crate::restrict::PathSet;

/// Computes [`FetchPlan`]s against a schema.
///
/// The planner only narrows: it picks columns and names joins and prefetches
/// that can go, it never asks for a relation the query does not already
/// fetch.
#[derive(Debug)]
pub struct FetchPlanner {
    index: Arc<SchemaIndex>,
    translator: NameTranslator,
    extractor: HintExtractor,
}

impl FetchPlanner {
    /// Create a planner over a schema index.
    pub fn new(index: Arc<SchemaIndex>) -> Self {
        Self {
            translator: NameTranslator::new(Arc::clone(&index)),
            extractor: HintExtractor::new(Arc::clone(&index)),
            index,
        }
    }

    /// The API to storage name translator.
    pub fn translator(&self) -> &NameTranslator {
        &self.translator
    }

    /// The extractor classifying storage paths.
    pub fn extractor(&self) -> &HintExtractor {
        &self.extractor
    }

    /// Plan the minimal fetch for `record_type` given the resolved include and
    /// exclude sets.
    ///
    /// A join or prefetch is eliminated only when no selected path needs it
    /// and no filter or ordering of `query` depends on it. A query that cannot
    /// report its filter dependencies keeps every join.
    #[instrument(skip(self, query, include, exclude), fields(include = include.len(), exclude = exclude.len()))]
    pub fn optimize(
        &self,
        query: &dyn FetchQuery,
        record_type: &str,
        include: &PathSet,
        exclude: &PathSet,
    ) -> FetchPlan {
        let desc = self.index.describe(record_type);
        let identity = desc.identity_field();
        let excluded: Vec<FieldPath> = self
            .translator
            .translate_exclude(record_type, exclude)
            .into_iter()
            .collect();
        let is_excluded = |path: &FieldPath| excluded.iter().any(|e| path.starts_with(e));

        let joins = query.current_joins();
        let prefetches = query.current_prefetches();
        let guard = query.filter_dependent_joins();

        let translated = if include.matches_all() {
            BTreeSet::new()
        } else {
            self.translator.translate_include(record_type, include)
        };

        // `None` means every relation is needed.
        let (columns, needed): (BTreeSet<String>, Option<BTreeSet<FieldPath>>) =
            if translated.is_empty() {
                let columns = self.translator.default_columns(record_type);
                (columns.iter().cloned().collect(), None)
            } else {
                let tree = self.extractor.extract(record_type, &translated);
                let needed = tree
                    .for_join()
                    .iter()
                    .map(|r| FieldPath::parse_with(r, PATH_SEPARATOR))
                    .collect();
                (tree.for_select(), Some(needed))
            };

        // Only relations the query already fetches can contribute columns.
        let fetched: Vec<FieldPath> = joins
            .iter()
            .chain(&prefetches)
            .map(|r| FieldPath::parse_with(r, PATH_SEPARATOR))
            .collect();

        let mut select_columns = Vec::with_capacity(columns.len());
        for column in columns {
            let path = FieldPath::parse_with(&column, PATH_SEPARATOR);
            let Some((last, parent)) = path.segments().split_last() else {
                continue;
            };
            if parent.is_empty() {
                if last != identity && is_excluded(&path) {
                    continue;
                }
                select_columns.push(column);
                continue;
            }

            let parent = FieldPath::new(parent);
            if !fetched.iter().any(|r| r.starts_with(&parent)) {
                continue;
            }
            if is_excluded(&path) {
                // A nested identity goes only with its relation.
                let keeps_identity = !is_excluded(&parent)
                    && self.target_identity(record_type, &parent).as_deref()
                        == Some(last.as_str());
                if !keeps_identity {
                    continue;
                }
            }
            select_columns.push(column);
        }

        let droppable = |relation: &str| -> bool {
            let path = FieldPath::parse_with(relation, PATH_SEPARATOR);
            let required = match &needed {
                None => true,
                Some(needed) => needed.iter().any(|n| n.starts_with(&path)),
            };
            if required && !is_excluded(&path) {
                return false;
            }
            let depended_on = match &guard {
                None => true,
                Some(guard) => guard
                    .iter()
                    .any(|g| FieldPath::parse_with(g, PATH_SEPARATOR).starts_with(&path)),
            };
            if depended_on {
                debug!(relation, known = guard.is_some(), "keeping join filters may depend on");
                return false;
            }
            true
        };

        let eliminated_joins: Vec<String> =
            joins.iter().filter(|j| droppable(j.as_str())).cloned().collect();
        let eliminated_prefetches: Vec<String> =
            prefetches.iter().filter(|p| droppable(p.as_str())).cloned().collect();

        let plan = FetchPlan {
            select_columns,
            eliminated_joins,
            eliminated_prefetches,
        };
        debug!(record_type, plan = %plan, "computed fetch plan");
        plan
    }

    /// Identity column of the record type reached through the storage path
    /// `relation`, if any.
    fn target_identity(&self, record_type: &str, relation: &FieldPath) -> Option<String> {
        let mut desc = self.index.describe(record_type);
        for segment in relation.segments() {
            desc = self.index.describe_target(desc.name(), segment)?;
        }
        Some(desc.identity_field().to_string()).filter(|id| !id.is_empty())
    }
}
