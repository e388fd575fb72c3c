//! Tabular structural parser
//!
//! Tabular EXPLAIN output carries one row per operation and no nesting
//! signal, so no parent/child inference is attempted: rows become a flat
//! list of nodes. A lone row is the plan itself; several rows hang under
//! a synthetic root in row order.

use crate::error::{MalformedPlanError, Result};
use crate::plan::{NormalizedSource, PlanNode};
use crate::tree::{SubplanRegistry, node_from_caption};

/// Column headers that carry the operation label, in preference order.
const LABEL_COLUMNS: &[&str] = &["operation", "detail", "table"];

/// Column header carrying the planner row estimate.
const ROWS_COLUMN: &str = "rows";

pub(super) fn build(source: &NormalizedSource) -> Result<(PlanNode, SubplanRegistry)> {
    let lines: Vec<&str> = source.lines().collect();
    let registry = SubplanRegistry::new();

    // Single-line "-> ..." headers (trivial MySQL tree plans) and other
    // arrow-only row sets: each row is a full caption.
    let mut nodes: Vec<PlanNode> = if lines.iter().all(|l| l.starts_with("->")) {
        lines
            .iter()
            .map(|l| node_from_caption(l.trim_start_matches("->").trim_start()))
            .collect()
    } else {
        parse_pipe_rows(&lines)?
    };

    match nodes.len() {
        0 => Err(MalformedPlanError::InvalidStructure(
            "no tabular rows found".into(),
        )),
        1 => Ok((nodes.pop().unwrap(), registry)),
        _ => {
            let mut root = PlanNode::new("Plan");
            root.children = nodes;
            Ok((root, registry))
        }
    }
}

/// Splits `|`-separated rows against the header line. Header names key
/// each cell into `extra`; a `rows` column feeds the row estimate and the
/// label comes from the best-matching label column.
fn parse_pipe_rows(lines: &[&str]) -> Result<Vec<PlanNode>> {
    let Some((header_line, data_lines)) = lines.split_first() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = split_row(header_line)
        .into_iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(MalformedPlanError::InvalidStructure(
            "tabular header row has no columns".into(),
        ));
    }

    let mut nodes = Vec::with_capacity(data_lines.len());
    for line in data_lines {
        let cells = split_row(line);
        nodes.push(row_to_node(&headers, &cells));
    }
    Ok(nodes)
}

fn row_to_node(headers: &[String], cells: &[&str]) -> PlanNode {
    let caption = LABEL_COLUMNS
        .iter()
        .find_map(|label| cell_by_header(headers, cells, label))
        .or_else(|| cells.iter().copied().find(|c| !c.is_empty()))
        .unwrap_or("");

    let mut node = node_from_caption(caption);

    if node.plan_rows.is_none()
        && let Some(rows) = cell_by_header(headers, cells, ROWS_COLUMN)
    {
        node.plan_rows = rows.parse().ok();
    }

    for (header, cell) in headers.iter().zip(cells.iter()) {
        if cell.is_empty() || cell.eq_ignore_ascii_case("null") {
            continue;
        }
        node.extra.insert(header.clone(), cell.to_string());
    }

    node
}

fn cell_by_header<'a>(headers: &[String], cells: &'a [&str], wanted: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
        .and_then(|i| cells.get(i).copied())
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("null"))
}

fn split_row<'a>(line: &'a str) -> Vec<&'a str> {
    line.split('|').map(str::trim).collect()
}
