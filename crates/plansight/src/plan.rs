//! Plan Model - Data structures for representing query execution plans
//!
//! This module defines the engine-agnostic plan model shared by every
//! dialect parser. Nodes carry a free-text operation label plus the common
//! numeric statistics; anything engine-specific lands in the `extra` map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dialect::Dialect;

/// Key under which a node records a non-owning shared-subplan reference.
pub const REFERS_TO_KEY: &str = "refersTo";

/// Key marking a reference that did not resolve against the registry.
pub const UNRESOLVED_REF_KEY: &str = "unresolvedRef";

/// Key retaining the per-loop startup value of an `actual time=a..b` range.
pub const ACTUAL_STARTUP_TIME_KEY: &str = "actualStartupTime";

/// Raw EXPLAIN text with decoration stripped; line-oriented, order preserving.
///
/// Produced by [`crate::normalize::normalize`], consumed by dialect
/// detection and the structural builders. Blank lines never survive
/// normalization, so `lines()` yields content lines only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource(String);

impl NormalizedSource {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the remaining content lines in source order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }
}

impl std::fmt::Display for NormalizedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single operation in the execution plan tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanNode {
    /// Free-text label of the operation, e.g. "Seq Scan on users"
    pub operation: String,
    /// Cost to return the first row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_cost: Option<f64>,
    /// Cost to return all rows; >= `startup_cost` when both are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    /// Planner row estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_rows: Option<u64>,
    /// Rows actually returned (EXPLAIN ANALYZE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_rows: Option<u64>,
    /// Cumulative execution time in milliseconds (EXPLAIN ANALYZE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_time_ms: Option<f64>,
    /// Number of executions of this node; absent means one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<u64>,
    /// Engine-specific fields not covered by the common schema
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
    /// Child operations; a child belongs to exactly one parent
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,
    /// Zero-based nesting level within the owning tree
    pub depth: usize,
}

impl PlanNode {
    /// Creates a new plan node with the given operation label
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Sets the nesting depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the cost range
    pub fn with_cost(mut self, startup: f64, total: f64) -> Self {
        self.startup_cost = Some(startup);
        self.total_cost = Some(total);
        self
    }

    /// Adds a child node
    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of executions; defaults to 1 when the source did not say
    pub fn loops(&self) -> u64 {
        self.loops.unwrap_or(1)
    }

    /// Returns true if this is a leaf node (no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The shared-subplan name this node references, if any
    pub fn refers_to(&self) -> Option<&str> {
        self.extra.get(REFERS_TO_KEY).map(String::as_str)
    }

    /// Returns the total number of nodes in this subtree (including self)
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Returns the maximum nesting depth of this subtree, counting self as 1
    pub fn max_depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| c.max_depth())
            .max()
            .unwrap_or(0)
    }

    /// Returns an iterator over this subtree, depth-first
    pub fn iter(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator::new(self)
    }
}

/// A named sub-tree (CTE, InitPlan, SubPlan) that the main tree may
/// reference from several points.
///
/// The document registry is the sole owner of the node tree; reference
/// sites carry only the name (`extra["refersTo"]`), so the plan never
/// becomes an aliased graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedSubplan {
    pub name: String,
    pub root: PlanNode,
}

impl SharedSubplan {
    pub fn new(name: impl Into<String>, root: PlanNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

/// A fully parsed, immutable plan document
///
/// Constructed once by [`crate::assemble::assemble`]; never mutated
/// afterwards. Re-parsing produces a new document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    /// Root of the main plan tree
    pub root: PlanNode,
    /// Registry of shared subplans, keyed by name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub shared_subplans: HashMap<String, SharedSubplan>,
    /// Aggregate execution time in milliseconds, when the source carried it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<f64>,
    /// The structural format the source was parsed as
    pub dialect: Dialect,
}

impl PlanDocument {
    /// Returns an iterator over the main tree's nodes, depth-first
    pub fn iter_nodes(&self) -> PlanNodeIterator<'_> {
        self.root.iter()
    }

    /// Fraction of total execution time spent in `node`, when both the
    /// document aggregate and the node's actual time are known.
    pub fn time_share(&self, node: &PlanNode) -> Option<f64> {
        let total = self.total_time_ms?;
        if total <= 0.0 {
            return None;
        }
        node.actual_time_ms.map(|t| t / total)
    }

    /// Looks up a shared subplan referenced by name
    pub fn subplan(&self, name: &str) -> Option<&SharedSubplan> {
        self.shared_subplans.get(name)
    }
}

/// Iterator for traversing plan nodes depth-first
pub struct PlanNodeIterator<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> PlanNodeIterator<'a> {
    fn new(root: &'a PlanNode) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for PlanNodeIterator<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order so we visit them in order
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
