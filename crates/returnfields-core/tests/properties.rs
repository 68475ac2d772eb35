//! Property tests for pruning and fetch-plan safety.

use std::sync::Arc;

use proptest::prelude::*;
use returnfields_core::{
    EntityDef, FieldDef, FieldPath, FetchPlanner, Frame, PathSet, RestrictionEngine, SchemaIndex,
    StaticSchema,
};
use returnfields_proto::{FilterExpr, QuerySpec};

const FIELDS: [&str; 6] = ["id", "name", "email", "karma", "orders", "memo"];
const RELATIONS: [&str; 2] = ["karma", "orders"];

fn planner() -> FetchPlanner {
    let schema = StaticSchema::new()
        .with_entity(
            EntityDef::new("Customer", "id")
                .with_field(FieldDef::scalar("id"))
                .with_field(FieldDef::scalar("name"))
                .with_field(FieldDef::scalar("email"))
                .with_field(FieldDef::singular("karma", "Karma").with_foreign_key("karma_id"))
                .with_field(FieldDef::plural("orders", "Order"))
                .with_field(FieldDef::scalar("memo")),
        )
        .with_entity(
            EntityDef::new("Karma", "id")
                .with_field(FieldDef::scalar("id"))
                .with_field(FieldDef::scalar("point")),
        )
        .with_entity(
            EntityDef::new("Order", "id")
                .with_field(FieldDef::scalar("id"))
                .with_field(FieldDef::scalar("price")),
        );
    FetchPlanner::new(Arc::new(SchemaIndex::from_provider(schema)))
}

fn arb_selection() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(FIELDS.to_vec(), 0..=FIELDS.len())
}

fn arb_noise() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("must not name a field", |s| !FIELDS.contains(&s.as_str()))
}

fn arb_paths() -> impl Strategy<Value = Vec<String>> {
    let nested = prop_oneof![
        Just("karma__point".to_string()),
        Just("orders__price".to_string()),
        Just("orders__id".to_string()),
    ];
    let plain = proptest::sample::select(FIELDS.to_vec()).prop_map(str::to_string);
    prop::collection::vec(prop_oneof![plain, nested], 0..5)
}

fn set(paths: &[&str]) -> PathSet {
    PathSet::from_paths(paths.iter().map(|p| FieldPath::from(*p)))
}

proptest! {
    #[test]
    fn prune_is_idempotent(include in arb_selection(), exclude in arb_selection()) {
        let engine = RestrictionEngine::standard();
        let frame = Frame::top_level("Customer", set(&include), set(&exclude));

        let once = engine.prune_fields(&frame, &FIELDS);
        let twice = engine.prune_fields(&frame, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn whole_relation_becomes_all(name in "[a-z]{1,12}") {
        let child = set(&[name.as_str()]).truncate_for_child(&name);
        prop_assert!(child.matches_all());
    }

    #[test]
    fn exclusion_wins(include in arb_selection(), exclude in arb_selection(), all in any::<bool>()) {
        let engine = RestrictionEngine::standard();
        let include = if all { PathSet::all() } else { set(&include) };
        let frame = Frame::top_level("Customer", include, set(&exclude));

        let pruned = engine.prune_fields(&frame, &FIELDS);
        for name in &exclude {
            prop_assert!(!pruned.contains(name));
        }
    }

    #[test]
    fn noise_is_ignored(include in arb_selection(), noise in arb_noise()) {
        let engine = RestrictionEngine::standard();
        let without = Frame::top_level("Customer", set(&include), PathSet::empty());

        let mut noisy: Vec<&str> = include.clone();
        noisy.push(noise.as_str());
        let with = Frame::top_level("Customer", set(&noisy), PathSet::empty());

        prop_assert_eq!(
            engine.prune_fields(&without, &FIELDS),
            engine.prune_fields(&with, &FIELDS)
        );
    }

    #[test]
    fn prune_preserves_order(include in arb_selection(), exclude in arb_selection()) {
        let engine = RestrictionEngine::standard();
        let frame = Frame::top_level("Customer", set(&include), set(&exclude));

        let pruned = engine.prune_fields(&frame, &FIELDS);
        let mut rest = FIELDS.iter();
        for name in pruned {
            prop_assert!(rest.any(|f| *f == name));
        }
    }

    #[test]
    fn filtered_relations_never_eliminated(
        relation in proptest::sample::select(RELATIONS.to_vec()),
        include in arb_paths(),
        exclude in arb_paths(),
        all in any::<bool>(),
    ) {
        let planner = planner();
        let query = QuerySpec::new("Customer")
            .select_related("karma")
            .prefetch_related("orders")
            .filter(FilterExpr::is_null(format!("{relation}__id")));

        let include = if all {
            PathSet::all()
        } else {
            PathSet::from_paths(include.iter().map(|p| FieldPath::from(p.as_str())))
        };
        let exclude = PathSet::from_paths(exclude.iter().map(|p| FieldPath::from(p.as_str())));

        let plan = planner.optimize(&query, "Customer", &include, &exclude);
        prop_assert!(!plan.eliminated_joins.iter().any(|j| j == relation));
        prop_assert!(!plan.eliminated_prefetches.iter().any(|p| p == relation));
    }
}
