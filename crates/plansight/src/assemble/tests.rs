//! Tests for the plan assembler

use std::collections::HashMap;

use super::*;
use crate::error::MalformedPlanError;
use crate::plan::{REFERS_TO_KEY, SharedSubplan};
use pretty_assertions::assert_eq;

// ============================================================================
// End-To-End
// ============================================================================

#[test]
fn test_parse_plan_single_arrow_line() {
    let doc = parse_plan("-> Limit: 5 row(s)  (cost=0.00..10.00 rows=5)", None)
        .expect("parse failed");

    assert_eq!(doc.dialect, Dialect::Tabular);
    assert_eq!(doc.root.operation, "Limit: 5 row(s)");
    assert_eq!(doc.root.startup_cost, Some(0.0));
    assert_eq!(doc.root.total_cost, Some(10.0));
    assert_eq!(doc.root.plan_rows, Some(5));
    assert!(doc.root.children.is_empty());
    assert_eq!(doc.total_time_ms, None);
}

#[test]
fn test_parse_plan_text_tree_with_analyze() {
    let input = "\
Hash Join  (cost=10.00..100.00 rows=500) (actual time=0.10..2.50 rows=480 loops=1)
  ->  Seq Scan on orders  (cost=0.00..50.00 rows=1000) (actual time=0.01..1.20 rows=1000 loops=1)
  ->  Hash  (cost=5.00..10.00 rows=100) (actual time=0.05..0.40 rows=100 loops=1)
(3 rows)";
    let doc = parse_plan(input, None).expect("parse failed");

    assert_eq!(doc.dialect, Dialect::TextTree);
    assert_eq!(doc.root.operation, "Hash Join");
    assert_eq!(doc.root.children.len(), 2);
    assert_eq!(doc.root.actual_rows, Some(480));
    // Root reported its own cumulative time, so the document uses it.
    assert_eq!(doc.total_time_ms, Some(2.5));

    let share = doc.time_share(&doc.root.children[0]).expect("share");
    assert!((share - 1.2 / 2.5).abs() < 1e-9);
}

#[test]
fn test_parse_plan_honors_dialect_hint() {
    // Detection would call this Json; the hint forces a text parse.
    let doc = parse_plan("{weird but single line}", Some(Dialect::TextTree)).expect("parse failed");
    assert_eq!(doc.dialect, Dialect::TextTree);
    assert_eq!(doc.root.operation, "{weird but single line}");
}

#[test]
fn test_parse_plan_propagates_json_error() {
    let result = parse_plan("{ definitely not json", None);
    assert!(matches!(result, Err(MalformedPlanError::InvalidJson(_))));
}

#[test]
fn test_parse_plan_empty_input() {
    assert!(matches!(
        parse_plan("   \n\n", None),
        Err(MalformedPlanError::EmptyInput)
    ));
}

// ============================================================================
// Total Time
// ============================================================================

#[test]
fn test_total_time_falls_back_to_child_sum() {
    let mut left = PlanNode::new("Seq Scan on a");
    left.actual_time_ms = Some(1.5);
    let mut right = PlanNode::new("Seq Scan on b");
    right.actual_time_ms = Some(0.5);
    let root = PlanNode::new("Append").with_child(left).with_child(right);

    let doc = assemble(root, HashMap::new(), Dialect::TextTree);
    assert_eq!(doc.total_time_ms, Some(2.0));
}

#[test]
fn test_total_time_unset_without_actuals() {
    let root = PlanNode::new("Sort").with_child(PlanNode::new("Seq Scan"));
    let doc = assemble(root, HashMap::new(), Dialect::TextTree);
    assert_eq!(doc.total_time_ms, None);
}

// ============================================================================
// Reference Resolution
// ============================================================================

#[test]
fn test_unresolved_reference_is_marked_not_fatal() {
    let input = "Append\n  CTE Scan on ghost (CTE ghost)";
    let doc = parse_plan(input, None).expect("parse failed");

    let scan = &doc.root.children[0];
    assert_eq!(scan.refers_to(), Some("ghost"));
    assert_eq!(scan.extra.get(UNRESOLVED_REF_KEY), Some(&"ghost".to_string()));
}

#[test]
fn test_resolved_reference_is_not_marked() {
    let input = "Append\n  CTE totals\n    Seq Scan on big\n  CTE Scan on totals (CTE totals)";
    let doc = parse_plan(input, None).expect("parse failed");

    let scan = &doc.root.children[0];
    assert_eq!(scan.refers_to(), Some("totals"));
    assert!(!scan.extra.contains_key(UNRESOLVED_REF_KEY));
    assert_eq!(doc.subplan("totals").map(|s| s.root.operation.as_str()), Some("CTE totals"));
}

#[test]
fn test_references_inside_subplans_are_checked_too() {
    let mut inner = PlanNode::new("CTE Scan on ghost");
    inner
        .extra
        .insert(REFERS_TO_KEY.to_string(), "ghost".to_string());
    let mut registry: SubplanRegistry = HashMap::new();
    registry.insert(
        "totals".to_string(),
        SharedSubplan {
            name: "totals".to_string(),
            root: PlanNode::new("CTE totals").with_child(inner),
        },
    );

    let doc = assemble(PlanNode::new("Result"), registry, Dialect::TextTree);
    let marked = &doc.subplan("totals").expect("subplan").root.children[0];
    assert_eq!(marked.extra.get(UNRESOLVED_REF_KEY), Some(&"ghost".to_string()));
}

// ============================================================================
// Document Round-Trip
// ============================================================================

#[test]
fn test_assembled_document_survives_serde() {
    let input = "\
Append  (cost=0.00..20.00 rows=200)
  CTE totals
    Seq Scan on big  (cost=0.00..15.00 rows=150)
  CTE Scan on totals (CTE totals)  (cost=0.00..3.00 rows=150)";
    let doc = parse_plan(input, None).expect("parse failed");

    let json = serde_json::to_string(&doc).expect("serialize");
    let back: PlanDocument = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, doc);
}
