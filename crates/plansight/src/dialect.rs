//! Dialect Detection
//!
//! Classifies normalized EXPLAIN output as a JSON tree, an indented text
//! tree, or tabular rows, so structural parsing can dispatch on a closed
//! enum instead of re-sniffing the input in each builder.

use serde::{Deserialize, Serialize};

use crate::plan::NormalizedSource;

/// The mutually exclusive structural formats EXPLAIN output may take
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Indented caption tree, with or without `->` markers
    TextTree,
    /// A JSON value (nested objects/arrays carrying a children field)
    Json,
    /// One row per operation, `|`-separated columns, no nesting signal
    Tabular,
}

/// Detects the dialect of normalized EXPLAIN output.
///
/// Heuristic, in priority order: a `[` or `{` prefix means JSON; content
/// lines that are all unindented `->` rows, or that share `|` separators
/// at consistent offsets, mean tabular; anything else is a text tree.
/// Detection never fails - ambiguous input defaults to [`Dialect::TextTree`],
/// the most permissive parser.
pub fn detect(source: &NormalizedSource) -> Dialect {
    let trimmed = source.as_str().trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Dialect::Json;
    }

    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Dialect::TextTree;
    }

    // MySQL emits single-row "-> ..." headers for trivial plans; indented
    // arrow lines stay TextTree so real trees keep their nesting.
    if lines.iter().all(|l| l.starts_with("->")) {
        return Dialect::Tabular;
    }

    if is_pipe_table(&lines) {
        return Dialect::Tabular;
    }

    Dialect::TextTree
}

/// A fixed-width table keeps its `|` separators at identical byte offsets
/// on every row; header-only fragments (fewer than two lines) don't count.
fn is_pipe_table(lines: &[&str]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let offsets = pipe_offsets(lines[0]);
    if offsets.is_empty() {
        return false;
    }
    lines[1..].iter().all(|l| pipe_offsets(l) == offsets)
}

fn pipe_offsets(line: &str) -> Vec<usize> {
    line.bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'|')
        .map(|(i, _)| i)
        .collect()
}
