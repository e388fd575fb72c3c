//! Tests for the statistics extractor

use super::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Cost Anchors
// ============================================================================

#[test]
fn test_cost_range_and_rows() {
    let (stats, _) = extract_stats("Seq Scan on users  (cost=0.00..10.50 rows=100)");
    assert_eq!(stats.startup_cost, Some(0.0));
    assert_eq!(stats.total_cost, Some(10.5));
    assert_eq!(stats.plan_rows, Some(100));
}

#[test]
fn test_single_cost_leaves_startup_unset() {
    // The single-value form never synthesizes a startup cost.
    let (stats, _) = extract_stats("Table scan on t  (cost=4.12 rows=20)");
    assert_eq!(stats.startup_cost, None);
    assert_eq!(stats.total_cost, Some(4.12));
    assert_eq!(stats.plan_rows, Some(20));
}

#[test]
fn test_scientific_notation_costs() {
    let (stats, _) = extract_stats("Sort  (cost=1e3..2e3 rows=1e2)");
    assert_eq!(stats.startup_cost, Some(1000.0));
    assert_eq!(stats.total_cost, Some(2000.0));
    assert_eq!(stats.plan_rows, Some(100));
}

#[test]
fn test_negative_exponent_cost() {
    let (stats, _) = extract_stats("Limit  (cost=2.5e-1..1.5E+1 rows=1)");
    assert_eq!(stats.startup_cost, Some(0.25));
    assert_eq!(stats.total_cost, Some(15.0));
}

#[test]
fn test_cost_anchor_requires_word_boundary() {
    let (stats, label) = extract_stats("Scan (subcost=5)");
    assert_eq!(stats.total_cost, None);
    assert_eq!(label, "Scan (subcost=5)");
}

#[test]
fn test_inverted_cost_range_sets_nothing() {
    let (stats, label) = extract_stats("Scan (cost=10.00..5.00 rows=3)");
    assert_eq!(stats.startup_cost, None);
    assert_eq!(stats.total_cost, None);
    assert_eq!(stats.plan_rows, Some(3));
    // The refused token stays visible in the label.
    assert!(label.contains("cost=10.00..5.00"));
}

#[test]
fn test_multibyte_caption_scans_safely() {
    let (stats, label) = extract_stats("Seq Scan on café  (cost=1.00..2.00 rows=3)");
    assert_eq!(stats.startup_cost, Some(1.0));
    assert_eq!(stats.total_cost, Some(2.0));
    assert_eq!(stats.plan_rows, Some(3));
    assert_eq!(label, "Seq Scan on café");
}

#[test]
fn test_multibyte_only_caption_passes_through() {
    let caption = "Tri par clé: département, ville";
    let (stats, label) = extract_stats(caption);
    assert_eq!(stats, NodeStats::default());
    assert_eq!(label, caption);
}

// ============================================================================
// Actual Time / Rows / Loops
// ============================================================================

#[test]
fn test_actual_time_range_takes_cumulative_value() {
    let (stats, _) = extract_stats("Seq Scan  (actual time=0.012..0.089 rows=95 loops=1)");
    assert_eq!(stats.actual_time_ms, Some(0.089));
    assert_eq!(stats.actual_startup_time_ms, Some(0.012));
    assert_eq!(stats.actual_rows, Some(95));
    assert_eq!(stats.loops, Some(1));
}

#[test]
fn test_rows_before_actual_section_are_plan_rows() {
    let (stats, _) =
        extract_stats("Seq Scan  (cost=0.00..10.00 rows=100) (actual time=0.01..0.09 rows=95)");
    assert_eq!(stats.plan_rows, Some(100));
    assert_eq!(stats.actual_rows, Some(95));
}

#[test]
fn test_loops_absent_leaves_field_unset() {
    let (stats, _) = extract_stats("Seq Scan  (cost=0.00..10.00 rows=100)");
    assert_eq!(stats.loops, None);
}

#[test]
fn test_zero_loops_left_unset() {
    let (stats, _) = extract_stats("Hash  (actual time=0.00..0.00 rows=0 loops=0)");
    assert_eq!(stats.loops, None);
    assert_eq!(stats.actual_rows, Some(0));
}

#[test]
fn test_actual_time_single_value() {
    let (stats, _) = extract_stats("Hash  (actual time=1.5 rows=3 loops=2)");
    assert_eq!(stats.actual_time_ms, Some(1.5));
    assert_eq!(stats.actual_startup_time_ms, None);
    assert_eq!(stats.loops, Some(2));
}

// ============================================================================
// Label Cleanup
// ============================================================================

#[test]
fn test_label_loses_matched_tokens_and_empty_parens() {
    let (_, label) = extract_stats("Seq Scan on users  (cost=0.00..10.50 rows=100)");
    assert_eq!(label, "Seq Scan on users");
}

#[test]
fn test_label_keeps_surrounding_prose() {
    let (_, label) = extract_stats("Limit: 5 row(s)  (cost=0.00..10.00 rows=5)");
    assert_eq!(label, "Limit: 5 row(s)");
}

#[test]
fn test_no_match_leaves_everything_unchanged() {
    let caption = "Nested Loop Left Join";
    let (stats, label) = extract_stats(caption);
    assert_eq!(stats, NodeStats::default());
    assert_eq!(label, caption);
}

#[test]
fn test_unparseable_statistic_is_not_an_error() {
    let (stats, label) = extract_stats("Scan (cost=abc rows=xyz)");
    assert_eq!(stats.total_cost, None);
    assert_eq!(stats.plan_rows, None);
    assert_eq!(label, "Scan (cost=abc rows=xyz)");
}

// ============================================================================
// Numeric Scanner
// ============================================================================

#[test]
fn test_scan_number_forms() {
    assert_eq!(scan_number("42"), Some((42.0, 2)));
    assert_eq!(scan_number("3.14 rest"), Some((3.14, 4)));
    assert_eq!(scan_number("-7e2,"), Some((-700.0, 4)));
    assert_eq!(scan_number("10..20"), Some((10.0, 2)));
    assert_eq!(scan_number("abc"), None);
    assert_eq!(scan_number(".5"), None);
}

#[test]
fn test_scan_value_range() {
    assert_eq!(scan_value("10..20 rest"), Some((10.0, Some(20.0), 6)));
    assert_eq!(scan_value("10 rest"), Some((10.0, None, 2)));
}
