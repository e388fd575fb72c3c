//! Tests for fixed-width table rendering

use super::*;
use crate::assemble::parse_plan;
use crate::dialect::Dialect;
use pretty_assertions::assert_eq;

#[test]
fn test_columns_pad_to_widest_value() {
    let out = render_table(
        &["id", "table"],
        &[
            vec!["1".to_string(), "users".to_string()],
            vec!["12".to_string(), "order_items".to_string()],
        ],
    );
    assert_eq!(
        out,
        "id | table      \n\
         ---+------------\n\
         1  | users      \n\
         12 | order_items\n"
    );
}

#[test]
fn test_header_wider_than_values() {
    let out = render_table(&["select_type", "t"], &[vec!["SIMPLE".to_string(), "u".to_string()]]);
    assert_eq!(
        out,
        "select_type | t\n\
         ------------+--\n\
         SIMPLE      | u\n"
    );
}

#[test]
fn test_no_rows_still_renders_header_and_rule() {
    let out = render_table(&["id", "rows"], &[]);
    assert_eq!(out, "id | rows\n---+-----\n");
}

#[test]
fn test_rendered_table_parses_back_as_tabular() {
    let out = render_table(
        &["id", "table", "rows"],
        &[
            vec!["1".to_string(), "users".to_string(), "100".to_string()],
            vec!["1".to_string(), "orders".to_string(), "500".to_string()],
        ],
    );
    let doc = parse_plan(&out, None).expect("parse failed");

    assert_eq!(doc.dialect, Dialect::Tabular);
    assert_eq!(doc.root.children.len(), 2);
    assert_eq!(doc.root.children[0].operation, "users");
    assert_eq!(doc.root.children[0].plan_rows, Some(100));
    assert_eq!(doc.root.children[1].operation, "orders");
    assert_eq!(doc.root.children[1].plan_rows, Some(500));
}
