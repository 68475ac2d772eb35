//! In-memory description of a data fetch.
//!
//! [`QuerySpec`] stands in for an ORM query: it records which columns are
//! selected, which relations are joined (select-related) or prefetched, and
//! which filters and orderings apply. Field references inside filters and
//! orderings are `__`-joined paths; every non-final segment of such a path
//! implies a join the filter depends on.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::{FieldPath, PATH_SEPARATOR};
use crate::value::Value;

/// Filter expression over (possibly related) fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field not equals value.
    Ne { field: String, value: Value },
    /// Field less than value.
    Lt { field: String, value: Value },
    /// Field greater than value.
    Gt { field: String, value: Value },
    /// Field is in a set of values.
    In { field: String, values: Vec<Value> },
    /// Field is null.
    IsNull { field: String },
    /// All conditions must be true.
    And(Vec<FilterExpr>),
    /// At least one condition must be true.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an IN filter.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        FilterExpr::In {
            field: field.into(),
            values,
        }
    }

    /// Create an IS NULL filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        FilterExpr::IsNull {
            field: field.into(),
        }
    }

    /// Field paths referenced by this expression.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Eq { field, .. }
            | FilterExpr::Ne { field, .. }
            | FilterExpr::Lt { field, .. }
            | FilterExpr::Gt { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::IsNull { field } => out.push(field),
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                for expr in exprs {
                    expr.collect_fields(out);
                }
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Eq { field, value } => write!(f, "{field} = {value:?}"),
            FilterExpr::Ne { field, value } => write!(f, "{field} <> {value:?}"),
            FilterExpr::Lt { field, value } => write!(f, "{field} < {value:?}"),
            FilterExpr::Gt { field, value } => write!(f, "{field} > {value:?}"),
            FilterExpr::In { field, values } => write!(f, "{field} IN {values:?}"),
            FilterExpr::IsNull { field } => write!(f, "{field} IS NULL"),
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                let op = if matches!(self, FilterExpr::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                let parts: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(op))
            }
        }
    }
}

/// Order specification for sorting results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Field path to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// A fetch description for one root record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Root record type.
    pub root_entity: String,
    /// Selected columns (empty = every column of the root).
    pub columns: Vec<String>,
    /// Relations fetched through a join in the same statement.
    pub joins: Vec<String>,
    /// Relations fetched by a follow-up query.
    pub prefetches: Vec<String>,
    /// Row filters.
    pub filters: Vec<FilterExpr>,
    /// Ordering specification.
    pub order_by: Vec<OrderSpec>,
}

impl QuerySpec {
    /// Create a query over every column of `root_entity`.
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            columns: vec![],
            joins: vec![],
            prefetches: vec![],
            filters: vec![],
            order_by: vec![],
        }
    }

    /// Restrict the selected columns.
    pub fn only(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Join a relation in the same statement.
    pub fn select_related(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.joins.contains(&relation) {
            self.joins.push(relation);
        }
        self
    }

    /// Fetch a relation with a follow-up query.
    pub fn prefetch_related(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.prefetches.contains(&relation) {
            self.prefetches.push(relation);
        }
        self
    }

    /// Add a filter.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add ordering.
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Relation paths that filters and orderings traverse.
    ///
    /// `karma__point` depends on `karma`; `order__customer__name` depends on
    /// both `order` and `order__customer`.
    pub fn filter_joins(&self) -> BTreeSet<String> {
        let referenced = self
            .filters
            .iter()
            .flat_map(|f| f.fields())
            .chain(self.order_by.iter().map(|o| o.field.as_str()));

        let mut joins = BTreeSet::new();
        for field in referenced {
            let path = FieldPath::parse_with(field, PATH_SEPARATOR);
            let segments = path.segments();
            for end in 1..segments.len() {
                joins.insert(segments[..end].join(PATH_SEPARATOR));
            }
        }
        joins
    }

    /// Every join the statement performs: explicit joins plus filter joins.
    pub fn effective_joins(&self) -> BTreeSet<String> {
        let mut joins: BTreeSet<String> = self.joins.iter().cloned().collect();
        joins.extend(self.filter_joins());
        joins
    }
}

/// SQL-like rendering, stable across runs, for logs and assertions.
impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        write!(f, "SELECT {} FROM {}", columns, self.root_entity)?;
        for join in self.effective_joins() {
            write!(f, " JOIN {join}")?;
        }
        if !self.filters.is_empty() {
            let parts: Vec<String> = self.filters.iter().map(|e| e.to_string()).collect();
            write!(f, " WHERE {}", parts.join(" AND "))?;
        }
        if !self.order_by.is_empty() {
            let parts: Vec<String> = self
                .order_by
                .iter()
                .map(|o| match o.direction {
                    OrderDirection::Asc => format!("{} ASC", o.field),
                    OrderDirection::Desc => format!("{} DESC", o.field),
                })
                .collect();
            write!(f, " ORDER BY {}", parts.join(", "))?;
        }
        for prefetch in &self.prefetches {
            write!(f, "; PREFETCH {prefetch}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_joins() {
        let query = QuerySpec::new("Item")
            .filter(FilterExpr::eq("order__customer__name", "foo"))
            .filter(FilterExpr::gt("price", 10))
            .with_order(OrderSpec::desc("order__created_at"));

        let joins: Vec<_> = query.filter_joins().into_iter().collect();
        assert_eq!(joins, vec!["order", "order__customer"]);
    }

    #[test]
    fn test_nested_filter_fields() {
        let expr = FilterExpr::And(vec![
            FilterExpr::eq("a", 1),
            FilterExpr::Or(vec![FilterExpr::is_null("b__c"), FilterExpr::ne("d", 2)]),
        ]);
        assert_eq!(expr.fields(), vec!["a", "b__c", "d"]);
    }

    #[test]
    fn test_render() {
        let query = QuerySpec::new("Customer")
            .only(vec!["id".into(), "name".into()])
            .filter(FilterExpr::eq("karma__point", 0));
        let sql = query.to_string();
        assert!(sql.starts_with("SELECT id, name FROM Customer JOIN karma"));
        assert!(sql.contains("WHERE karma__point = Int32(0)"));

        let plain = QuerySpec::new("Order").prefetch_related("items");
        assert_eq!(plain.to_string(), "SELECT * FROM Order; PREFETCH items");
        assert!(!plain.to_string().contains("JOIN"));
    }

    #[test]
    fn test_relations_deduplicated() {
        let query = QuerySpec::new("Item")
            .select_related("order")
            .select_related("order")
            .prefetch_related("tags")
            .prefetch_related("tags");
        assert_eq!(query.joins, vec!["order"]);
        assert_eq!(query.prefetches, vec!["tags"]);
    }
}
