//! The query abstraction the planner rewrites.

use std::collections::BTreeSet;

use returnfields_proto::QuerySpec;

/// A pending data fetch whose shape can be narrowed.
///
/// Relation names are storage-level paths joined with `__`.
pub trait FetchQuery {
    /// Root record type fetched by the query.
    fn record_type(&self) -> &str;

    /// Replace the selected column list.
    fn select_columns(&mut self, columns: &[String]);

    /// Relations currently fetched through a join.
    fn current_joins(&self) -> BTreeSet<String>;

    /// Relations currently fetched by a follow-up query.
    fn current_prefetches(&self) -> BTreeSet<String>;

    /// Relations that filters or orderings depend on.
    ///
    /// `None` means the query cannot tell; callers must then assume every join
    /// is depended on.
    fn filter_dependent_joins(&self) -> Option<BTreeSet<String>>;

    /// Stop joining `relation`. Unknown names are ignored.
    fn drop_join(&mut self, relation: &str);

    /// Stop prefetching `relation`. Unknown names are ignored.
    fn drop_prefetch(&mut self, relation: &str);
}

impl FetchQuery for QuerySpec {
    fn record_type(&self) -> &str {
        &self.root_entity
    }

    fn select_columns(&mut self, columns: &[String]) {
        self.columns = columns.to_vec();
    }

    fn current_joins(&self) -> BTreeSet<String> {
        self.joins.iter().cloned().collect()
    }

    fn current_prefetches(&self) -> BTreeSet<String> {
        self.prefetches.iter().cloned().collect()
    }

    fn filter_dependent_joins(&self) -> Option<BTreeSet<String>> {
        Some(self.filter_joins())
    }

    fn drop_join(&mut self, relation: &str) {
        self.joins.retain(|j| j != relation);
    }

    fn drop_prefetch(&mut self, relation: &str) {
        self.prefetches.retain(|p| p != relation);
    }
}
