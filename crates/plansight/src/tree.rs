//! Structural Tree Builder
//!
//! Converts classified input into a tree of plan nodes plus a registry of
//! shared subplans (CTEs, InitPlans). Parent/child relationships come from
//! indentation, JSON nesting, or row order depending on the dialect; the
//! statistics extractor runs on every caption as nodes are constructed.

use std::collections::HashMap;

use crate::dialect::Dialect;
use crate::error::{MalformedPlanError, Result};
use crate::plan::{ACTUAL_STARTUP_TIME_KEY, NormalizedSource, PlanNode, SharedSubplan};
use crate::stats::extract_stats;

pub mod json;
pub mod tabular;
pub mod text;

/// Registry of shared subplans produced alongside the main tree.
pub type SubplanRegistry = HashMap<String, SharedSubplan>;

/// Nesting limit guarding against degenerate, pathologically indented
/// input. Real plans stay far below this.
pub const MAX_DEPTH: usize = 128;

/// Builds the plan tree and shared-subplan registry for the given dialect.
///
/// Fails when no content lines remain after normalization, when JSON
/// dialect input does not parse as a JSON value, or when nesting exceeds
/// [`MAX_DEPTH`].
pub fn build(source: &NormalizedSource, dialect: Dialect) -> Result<(PlanNode, SubplanRegistry)> {
    if source.is_empty() {
        return Err(MalformedPlanError::EmptyInput);
    }

    let (mut root, mut registry) = match dialect {
        Dialect::Json => json::build(source)?,
        Dialect::TextTree => text::build(source)?,
        Dialect::Tabular => tabular::build(source)?,
    };

    assign_depths(&mut root)?;
    for subplan in registry.values_mut() {
        assign_depths(&mut subplan.root)?;
    }

    tracing::debug!(
        nodes = root.node_count(),
        subplans = registry.len(),
        ?dialect,
        "built plan tree"
    );

    Ok((root, registry))
}

/// Constructs a node from a free-text caption, extracting the embedded
/// statistics so the stored label is clean prose.
pub(crate) fn node_from_caption(caption: &str) -> PlanNode {
    let (stats, label) = extract_stats(caption);

    let mut node = PlanNode::new(label);
    node.startup_cost = stats.startup_cost;
    node.total_cost = stats.total_cost;
    node.plan_rows = stats.plan_rows;
    node.actual_rows = stats.actual_rows;
    node.actual_time_ms = stats.actual_time_ms;
    node.loops = stats.loops;
    if let Some(startup) = stats.actual_startup_time_ms {
        node.extra
            .insert(ACTUAL_STARTUP_TIME_KEY.to_string(), startup.to_string());
    }
    node
}

/// Re-derives the zero-based `depth` field across a tree, iteratively so
/// pathological nesting cannot exhaust the call stack, and enforces
/// [`MAX_DEPTH`].
fn assign_depths(root: &mut PlanNode) -> Result<()> {
    let mut stack: Vec<(&mut PlanNode, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        if depth >= MAX_DEPTH {
            return Err(MalformedPlanError::NestingTooDeep { limit: MAX_DEPTH });
        }
        node.depth = depth;
        for child in node.children.iter_mut() {
            stack.push((child, depth + 1));
        }
    }
    Ok(())
}
