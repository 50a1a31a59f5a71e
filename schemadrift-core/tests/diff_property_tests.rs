// Property tests for the comparison engine and statement round-trip
use proptest::prelude::*;
use schemadrift_core::statement::{parse, render};
use schemadrift_core::{diff_index, diff_set, IndexDefinition, IndexKeyField, IndexSet, KeyPattern};
use serde_json::{json, Value};
use std::collections::HashSet;

fn key_field_strategy() -> impl Strategy<Value = IndexKeyField> {
    let spec = prop_oneof![
        Just(json!(1)),
        Just(json!(-1)),
        Just(json!("text")),
        Just(json!("hashed")),
        Just(json!("2dsphere")),
    ];
    ("[a-z_][a-z0-9_]{0,6}(\\.[a-z]{1,4})?", spec).prop_map(|(field, spec)| IndexKeyField::new(field, spec))
}

fn keys_strategy() -> impl Strategy<Value = KeyPattern> {
    prop::collection::vec(key_field_strategy(), 1..4).prop_map(|mut fields| {
        let mut seen = HashSet::new();
        fields.retain(|f| seen.insert(f.field.clone()));
        KeyPattern::new(fields)
    })
}

fn document_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!({"status": "active"})),
        Just(json!({"age": {"$gt": 21}})),
        Just(json!({"deleted": {"$exists": false}, "tenant": "a: b"})),
        Just(json!({"locale": "en", "strength": 2})),
        Just(json!({"locale": "hu", "caseLevel": true})),
    ]
}

prop_compose! {
    fn index_strategy(name: String)(
        keys in keys_strategy(),
        unique in proptest::option::of(any::<bool>()),
        sparse in proptest::option::of(any::<bool>()),
        ttl in proptest::option::of(0i32..1_000_000),
        partial in proptest::option::of(document_strategy()),
        collation in proptest::option::of(document_strategy()),
    ) -> IndexDefinition {
        IndexDefinition {
            keys,
            name: name.clone(),
            unique,
            sparse,
            expire_after_seconds: ttl,
            partial_filter_expression: partial,
            collation,
        }
    }
}

fn named_index_strategy() -> impl Strategy<Value = IndexDefinition> {
    "[a-z]{1,3}".prop_flat_map(index_strategy)
}

fn index_set_strategy() -> impl Strategy<Value = IndexSet> {
    prop::collection::vec(named_index_strategy(), 0..8).prop_map(|v| v.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_equal_definitions_have_no_reasons(index in named_index_strategy()) {
        prop_assert!(diff_index(&index, &index.clone()).is_empty());
    }

    #[test]
    fn prop_reasons_are_order_stable(a in named_index_strategy(), b in named_index_strategy()) {
        prop_assert_eq!(diff_index(&a, &b), diff_index(&a, &b));
    }

    #[test]
    fn prop_reordered_keys_give_one_key_reason(index in named_index_strategy()) {
        prop_assume!(index.keys.len() > 1);
        let mut reversed = index.keys.fields().to_vec();
        reversed.reverse();
        let other = IndexDefinition { keys: KeyPattern::new(reversed), ..index.clone() };

        let reasons = diff_index(&index, &other);
        prop_assert_eq!(reasons.len(), 1);
        prop_assert!(reasons[0].property().is_none());
    }

    #[test]
    fn prop_diff_set_partitions_are_exhaustive_and_disjoint(
        source in index_set_strategy(),
        target in index_set_strategy(),
    ) {
        let report = diff_set(&source, &target);

        let mut seen = HashSet::new();
        for name in report
            .common
            .iter()
            .map(|c| c.name.as_str())
            .chain(report.source_only.iter().map(String::as_str))
            .chain(report.target_only.iter().map(String::as_str))
        {
            prop_assert!(seen.insert(name.to_string()), "{} appears twice", name);
        }

        let union: HashSet<String> = source.names().chain(target.names()).map(str::to_string).collect();
        prop_assert_eq!(seen, union);

        for common in &report.common {
            prop_assert!(source.contains(&common.name) && target.contains(&common.name));
        }
        for name in &report.source_only {
            prop_assert!(source.contains(name) && !target.contains(name));
        }
        for name in &report.target_only {
            prop_assert!(!source.contains(name) && target.contains(name));
        }
    }

    #[test]
    fn prop_statement_round_trips(index in named_index_strategy()) {
        let (collection, parsed) = parse(&render("orders", &index)).unwrap();
        prop_assert_eq!(collection, "orders");
        prop_assert!(diff_index(&index, &parsed).is_empty());
        prop_assert_eq!(parsed.name, index.name);
    }
}
