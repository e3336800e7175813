//! Unit tests for query composition through the public API

use tabcmp::query::{
    build_except_distinct_query, build_union_query, normalize_order_by_clause,
    normalize_where_clause, resolve_projection, ExceptOptions, QueryPlan,
};
use tabcmp::table_ref::provenance_labels;
use tabcmp::TableRef;

fn table(path: &str) -> TableRef {
    TableRef::parse(path).unwrap()
}

#[test]
fn test_normalization_is_idempotent() {
    for input in ["id > 3", "WHERE id > 3", "  where id > 3  "] {
        let once = normalize_where_clause(Some(input));
        let twice = normalize_where_clause(once.as_deref());
        assert_eq!(once, twice);
        assert!(once.unwrap().to_lowercase().starts_with("where "));
    }

    for input in ["id desc", "ORDER BY id desc", "order   by id"] {
        let once = normalize_order_by_clause(Some(input));
        assert_eq!(once, normalize_order_by_clause(once.as_deref()));
    }
}

#[test]
fn test_blank_fragments_disappear() {
    assert_eq!(normalize_where_clause(Some("   ")), None);
    assert_eq!(normalize_order_by_clause(None), None);
}

#[test]
fn test_explicit_projection_is_verbatim() {
    let common = vec!["a".to_string(), "b".to_string()];
    assert_eq!(resolve_projection(Some("b ,a"), Some(&common)), "b ,a");
    assert_eq!(resolve_projection(None, None::<&Vec<String>>), "*");
}

#[test]
fn test_labeled_export_query_shape() {
    let (label1, _) = provenance_labels(&table("p.d.orders"), &table("p.d.orders_v2"));
    let query = build_except_distinct_query(
        &table("p.d.orders"),
        &table("p.d.orders_v2"),
        "id, total",
        Some("where id > 0"),
        ExceptOptions {
            source_label: Some(&label1),
            ..Default::default()
        },
    );

    assert!(query.starts_with("SELECT *, 'exclusive_to_orders' as source_table FROM ("));
    assert_eq!(query.matches("where id > 0").count(), 2);
    assert!(query.contains("EXCEPT DISTINCT"));
    assert!(!query.contains("LIMIT"));
}

#[test]
fn test_union_requires_subqueries() {
    assert!(build_union_query(&[], None).is_err());
}

#[test]
fn test_plan_fingerprint_tracks_filter() {
    let t1 = table("p.d.a");
    let t2 = table("p.d.b");
    let labels = ("exclusive_to_a", "exclusive_to_b");

    let unfiltered = QueryPlan::build(&t1, &t2, "id", None, None, 10, labels).unwrap();
    let same = QueryPlan::build(&t1, &t2, "id", None, Some("order by id"), 5, labels).unwrap();
    let filtered =
        QueryPlan::build(&t1, &t2, "id", Some("where id > 1"), None, 10, labels).unwrap();

    assert_eq!(unfiltered.fingerprint(), same.fingerprint());
    assert_ne!(unfiltered.fingerprint(), filtered.fingerprint());
    assert_eq!(unfiltered.fingerprint().len(), 16);
}
