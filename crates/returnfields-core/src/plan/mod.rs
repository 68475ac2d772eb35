//! Query optimization.
//!
//! Turns the include and exclude sets of a top-level request into a
//! [`FetchPlan`]: which columns to select and which joins and prefetches the
//! response can do without.

mod hints;
mod planner;
mod query;
mod translate;

use std::fmt;

use serde::Serialize;

pub use hints::{HintExtractor, HintTree};
pub use planner::FetchPlanner;
pub use query::FetchQuery;
pub use translate::NameTranslator;

/// The minimal fetch shape for one request.
///
/// All lists are sorted so that generated queries are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchPlan {
    /// Storage columns to select, nested ones in `relation__column` form.
    pub select_columns: Vec<String>,
    /// Joins to drop.
    pub eliminated_joins: Vec<String>,
    /// Prefetches to drop.
    pub eliminated_prefetches: Vec<String>,
}

impl FetchPlan {
    /// Apply the plan to a query.
    ///
    /// Applying the same plan twice leaves the query as applying it once.
    pub fn apply(&self, query: &mut dyn FetchQuery) {
        if !self.select_columns.is_empty() {
            query.select_columns(&self.select_columns);
        }
        for join in &self.eliminated_joins {
            query.drop_join(join);
        }
        for prefetch in &self.eliminated_prefetches {
            query.drop_prefetch(prefetch);
        }
    }

    /// Check if applying the plan changes nothing but the column list.
    pub fn eliminates_nothing(&self) -> bool {
        self.eliminated_joins.is_empty() && self.eliminated_prefetches.is_empty()
    }
}

impl fmt::Display for FetchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "select [{}]", self.select_columns.join(", "))?;
        if !self.eliminated_joins.is_empty() {
            write!(f, " drop joins [{}]", self.eliminated_joins.join(", "))?;
        }
        if !self.eliminated_prefetches.is_empty() {
            write!(f, " drop prefetches [{}]", self.eliminated_prefetches.join(", "))?;
        }
        Ok(())
    }
}
