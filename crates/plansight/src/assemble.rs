//! Plan Assembler
//!
//! Merges the structural tree and shared-subplan registry into the final
//! immutable [`PlanDocument`], computing the derived aggregates downstream
//! layout needs and resolving shared-subplan references. This is the
//! terminal stage of the pipeline; nothing mutates the document afterwards.

use std::collections::HashSet;

use crate::dialect::{Dialect, detect};
use crate::error::Result;
use crate::normalize::normalize;
use crate::plan::{PlanDocument, PlanNode, UNRESOLVED_REF_KEY};
use crate::tree::{SubplanRegistry, build};

/// Parses raw EXPLAIN text into a [`PlanDocument`], running the whole
/// pipeline: normalize, detect (unless `hint` pins the dialect), build,
/// assemble.
pub fn parse_plan(raw: &str, hint: Option<Dialect>) -> Result<PlanDocument> {
    let normalized = normalize(raw);
    let dialect = hint.unwrap_or_else(|| detect(&normalized));
    tracing::debug!(?dialect, hinted = hint.is_some(), "parsing plan source");

    let (root, registry) = build(&normalized, dialect)?;
    Ok(assemble(root, registry, dialect))
}

/// Assembles the finished document from a built tree and registry.
///
/// `total_time_ms` is the root's actual time when present, else the sum
/// of the top-level children's actual times, else unset. Unresolved
/// shared-subplan references are not fatal; the referencing node is
/// marked and the document still assembles so layout can render a stub.
pub fn assemble(root: PlanNode, shared_subplans: SubplanRegistry, dialect: Dialect) -> PlanDocument {
    let total_time_ms = total_time(&root);

    let known: HashSet<String> = shared_subplans.keys().cloned().collect();
    let mut root = root;
    mark_unresolved(&mut root, &known);

    let mut shared_subplans = shared_subplans;
    for subplan in shared_subplans.values_mut() {
        mark_unresolved(&mut subplan.root, &known);
    }

    PlanDocument {
        root,
        shared_subplans,
        total_time_ms,
        dialect,
    }
}

fn total_time(root: &PlanNode) -> Option<f64> {
    if root.actual_time_ms.is_some() {
        return root.actual_time_ms;
    }

    let child_times: Vec<f64> = root
        .children
        .iter()
        .filter_map(|c| c.actual_time_ms)
        .collect();
    if child_times.is_empty() {
        None
    } else {
        Some(child_times.iter().sum())
    }
}

/// Walks a tree and marks every reference whose name is missing from the
/// registry. The one recoverable anomaly in the pipeline.
fn mark_unresolved(root: &mut PlanNode, known: &HashSet<String>) {
    let mut stack: Vec<&mut PlanNode> = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(name) = node.refers_to().map(str::to_string)
            && !known.contains(&name)
        {
            tracing::warn!(subplan = %name, "unresolved shared-subplan reference");
            node.extra.insert(UNRESOLVED_REF_KEY.to_string(), name);
        }
        stack.extend(node.children.iter_mut());
    }
}

#[cfg(test)]
mod tests;
