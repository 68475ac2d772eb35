//! Classification of storage paths into fetch hints.
//!
//! A flat list of storage paths (`name`, `order__customer__id`) is drilled
//! down one relation at a time. At every level each name is classified as a
//! column, a foreign key column, a forward relation or a reverse relation.
//! Names the schema does not know are noise and are dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use returnfields_proto::{FieldPath, PATH_SEPARATOR};
use tracing::trace;

use crate::catalog::{EntityDescriptor, FieldKind, SchemaIndex};

/// Fetch hints for one level of a record tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintTree {
    /// Relation name leading to this level; empty at the root.
    pub name: String,
    /// Plain columns to select.
    pub fields: BTreeSet<String>,
    /// Foreign key columns backing selected singular relations.
    pub foreign_keys: BTreeSet<String>,
    /// Singular relations that can be joined.
    pub related: BTreeSet<String>,
    /// Plural relations that need a follow-up fetch.
    pub reverse_related: BTreeSet<String>,
    /// Nested levels, ordered by relation name.
    pub subtrees: Vec<HintTree>,
}

impl HintTree {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Every column to select, prefixed with its relation path.
    pub fn for_select(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_select(&FieldPath::default(), &mut out);
        out
    }

    /// Every relation path the fetch must traverse, singular or plural.
    pub fn for_join(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_join(&FieldPath::default(), &mut out);
        out
    }

    /// Find the subtree for a direct relation.
    pub fn subtree(&self, name: &str) -> Option<&HintTree> {
        self.subtrees.iter().find(|t| t.name == name)
    }

    fn collect_select(&self, prefix: &FieldPath, out: &mut BTreeSet<String>) {
        for column in self.fields.iter().chain(&self.foreign_keys) {
            out.insert(prefix.child(column.as_str()).join(PATH_SEPARATOR));
        }
        for sub in &self.subtrees {
            sub.collect_select(&prefix.child(sub.name.as_str()), out);
        }
    }

    fn collect_join(&self, prefix: &FieldPath, out: &mut BTreeSet<String>) {
        for relation in self.related.iter().chain(&self.reverse_related) {
            out.insert(prefix.child(relation.as_str()).join(PATH_SEPARATOR));
        }
        for sub in &self.subtrees {
            sub.collect_join(&prefix.child(sub.name.as_str()), out);
        }
    }
}

/// Builds [`HintTree`]s from storage paths.
#[derive(Debug)]
pub struct HintExtractor {
    index: Arc<SchemaIndex>,
}

impl HintExtractor {
    /// Create an extractor over a schema index.
    pub fn new(index: Arc<SchemaIndex>) -> Self {
        Self { index }
    }

    /// Classify `paths` relative to `record_type`.
    ///
    /// The identity column is always part of every level reached, root
    /// included, so fetched records can be told apart.
    pub fn extract<'a, I>(&self, record_type: &str, paths: I) -> HintTree
    where
        I: IntoIterator<Item = &'a FieldPath>,
    {
        let desc = self.index.describe(record_type);
        let paths: Vec<FieldPath> = paths.into_iter().cloned().collect();
        self.drilldown(&desc, &paths, "")
    }

    fn drilldown(&self, desc: &EntityDescriptor, paths: &[FieldPath], name: &str) -> HintTree {
        let mut tree = HintTree::new(name);
        if !desc.identity_field().is_empty() {
            tree.fields.insert(desc.identity_field().to_string());
        }

        let mut nested: BTreeMap<&str, Vec<FieldPath>> = BTreeMap::new();
        for path in paths {
            let Some(head) = path.head() else {
                continue;
            };
            if path.len() == 1 {
                self.classify(desc, head, &mut tree);
            } else {
                nested.entry(head).or_default().push(path.tail());
            }
        }

        for (head, rest) in nested {
            let Some(field) = desc.get_by_storage(head).filter(|f| f.is_relation()) else {
                trace!(record_type = desc.name(), name = head, "dropping path through non-relation");
                continue;
            };
            self.classify(desc, head, &mut tree);
            let Some(target) = field.target.as_deref() else {
                continue;
            };
            let target = self.index.describe(target);
            tree.subtrees.push(self.drilldown(&target, &rest, head));
        }
        tree
    }

    fn classify(&self, desc: &EntityDescriptor, name: &str, tree: &mut HintTree) {
        if name == desc.identity_field() {
            tree.fields.insert(name.to_string());
            return;
        }
        if let Some(field) = desc.get_by_storage(name) {
            match field.kind {
                FieldKind::Scalar => {
                    tree.fields.insert(name.to_string());
                }
                FieldKind::Singular => {
                    tree.related.insert(name.to_string());
                    if let Some(fk) = &field.foreign_key {
                        tree.foreign_keys.insert(fk.clone());
                    }
                }
                FieldKind::Plural => {
                    tree.reverse_related.insert(name.to_string());
                }
                FieldKind::Computed => {
                    trace!(record_type = desc.name(), name, "computed field has no column");
                }
            }
            return;
        }
        if desc
            .fields()
            .iter()
            .any(|f| f.foreign_key.as_deref() == Some(name))
        {
            tree.foreign_keys.insert(name.to_string());
            return;
        }
        trace!(record_type = desc.name(), name, "dropping noise");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, StaticSchema};

    fn extractor() -> HintExtractor {
        let schema = StaticSchema::new()
            .with_entity(
                EntityDef::new("Item", "id")
                    .with_field(FieldDef::scalar("id"))
                    .with_field(FieldDef::scalar("name"))
                    .with_field(FieldDef::singular("order", "Order").with_foreign_key("order_id")),
            )
            .with_entity(
                EntityDef::new("Order", "id")
                    .with_field(FieldDef::scalar("id"))
                    .with_field(FieldDef::scalar("name"))
                    .with_field(
                        FieldDef::singular("customer", "Customer").with_foreign_key("customer_id"),
                    )
                    .with_field(FieldDef::plural("item_set", "Item")),
            )
            .with_entity(
                EntityDef::new("Customer", "id")
                    .with_field(FieldDef::scalar("id"))
                    .with_field(FieldDef::scalar("name")),
            );
        HintExtractor::new(Arc::new(SchemaIndex::from_provider(schema)))
    }

    fn paths(raw: &[&str]) -> Vec<FieldPath> {
        raw.iter().map(|p| FieldPath::from(*p)).collect()
    }

    #[test]
    fn test_drilldown_classifies() {
        let tree = extractor().extract(
            "Item",
            &paths(&["name", "order__customer__name", "order__item_set__name"]),
        );

        assert!(tree.fields.contains("id"));
        assert!(tree.fields.contains("name"));
        assert!(tree.related.contains("order"));
        assert!(tree.foreign_keys.contains("order_id"));

        let order = tree.subtree("order").unwrap();
        assert!(order.related.contains("customer"));
        assert!(order.reverse_related.contains("item_set"));
        assert!(order.foreign_keys.contains("customer_id"));

        assert_eq!(
            tree.for_select().into_iter().collect::<Vec<_>>(),
            vec![
                "id",
                "name",
                "order__customer__id",
                "order__customer__name",
                "order__customer_id",
                "order__id",
                "order__item_set__id",
                "order__item_set__name",
                "order_id",
            ]
        );
        assert_eq!(
            tree.for_join().into_iter().collect::<Vec<_>>(),
            vec!["order", "order__customer", "order__item_set"]
        );
    }

    #[test]
    fn test_noise_is_dropped() {
        let tree = extractor().extract(
            "Item",
            &paths(&["xxxx", "name__xxxx", "order__xxxx", "order_id"]),
        );

        assert_eq!(tree.fields.iter().collect::<Vec<_>>(), vec!["id"]);
        assert!(tree.foreign_keys.contains("order_id"));
        // `order__xxxx` still reaches the relation, but only its identity.
        assert_eq!(
            tree.subtree("order").unwrap().fields.iter().collect::<Vec<_>>(),
            vec!["id"]
        );
    }

    #[test]
    fn test_unknown_root() {
        let tree = extractor().extract("Nope", &paths(&["id", "name"]));
        assert!(tree.for_select().is_empty());
        assert!(tree.for_join().is_empty());
    }
}
