//! Text-tree structural parser
//!
//! The general indented-caption format: nesting level comes from
//! indentation width (the `->` marker's column, when markers are present).
//! Construction is classic stack-based: a line more indented than its
//! predecessor becomes a child; a line at equal or lesser indentation
//! closes every deeper open node first.
//!
//! Lines opening a named shared-subplan context (`CTE <name>`,
//! `InitPlan <name>`, `SubPlan <name>`) divert their subtree into the
//! registry; captions carrying `(CTE <name>)`-style markers become
//! non-owning references instead of duplicated subtrees.

use crate::error::{MalformedPlanError, Result};
use crate::plan::{NormalizedSource, PlanNode, REFERS_TO_KEY, SharedSubplan};
use crate::stats::tidy_label;
use crate::tree::{SubplanRegistry, node_from_caption};

/// An under-construction node on the indentation stack.
struct Open {
    indent: usize,
    node: PlanNode,
    /// Set when this node opened a shared-subplan context; on close it
    /// goes to the registry instead of its structural parent.
    subplan: Option<String>,
}

pub(super) fn build(source: &NormalizedSource) -> Result<(PlanNode, SubplanRegistry)> {
    let lines: Vec<&str> = source.lines().collect();
    let has_arrows = lines.iter().any(|l| l.trim_start().starts_with("->"));

    let mut stack: Vec<Open> = Vec::new();
    let mut roots: Vec<PlanNode> = Vec::new();
    let mut registry = SubplanRegistry::new();

    for raw in &lines {
        let indent = indent_width(raw);
        let content = raw.trim_start();
        let is_arrow = content.starts_with("->");
        let caption = content
            .strip_prefix("->")
            .map(str::trim_start)
            .unwrap_or(content);

        let subplan = subplan_opener(caption);

        // Document-level timing lines trail the tree at indent zero and
        // are never operations, arrows or not.
        if is_timing_line(content) && !stack.is_empty() {
            attach_annotation(&mut stack, indent, content);
            continue;
        }

        // When the input uses arrow markers, arrow-less lines nested under
        // an open node are annotations (Filter:, Sort Key:, timing), not
        // operations of their own.
        if subplan.is_none() && has_arrows && !is_arrow && !stack.is_empty() {
            attach_annotation(&mut stack, indent, content);
            continue;
        }

        while stack.last().is_some_and(|o| o.indent >= indent) {
            let open = stack.pop().unwrap();
            close(open, &mut stack, &mut roots, &mut registry);
        }

        let (reference, caption) = extract_reference(caption);
        let mut node = node_from_caption(&caption);
        if let Some(name) = reference {
            node.extra.insert(REFERS_TO_KEY.to_string(), name);
        }

        stack.push(Open {
            indent,
            node,
            subplan,
        });
    }

    while let Some(open) = stack.pop() {
        close(open, &mut stack, &mut roots, &mut registry);
    }

    match roots.len() {
        0 => Err(MalformedPlanError::InvalidStructure(
            "no plan nodes found".into(),
        )),
        1 => Ok((roots.pop().unwrap(), registry)),
        _ => {
            // Several top-level operations with no common parent; hang
            // them under a synthetic root so the document stays a tree.
            let mut root = PlanNode::new("Plan");
            root.children = roots;
            Ok((root, registry))
        }
    }
}

/// Closes a finished node: registry if it opened a subplan context,
/// otherwise child of the enclosing open node, otherwise a top-level root.
fn close(
    open: Open,
    stack: &mut Vec<Open>,
    roots: &mut Vec<PlanNode>,
    registry: &mut SubplanRegistry,
) {
    match open.subplan {
        Some(name) => {
            registry.insert(name.clone(), SharedSubplan::new(name, open.node));
        }
        None => match stack.last_mut() {
            Some(parent) => parent.node.children.push(open.node),
            None => roots.push(open.node),
        },
    }
}

/// Attaches a `Key: value` annotation line to the node it is nested
/// under; document-level lines (indent zero) land on the outermost open
/// node. Lines without a key/value shape are dropped.
fn attach_annotation(stack: &mut [Open], indent: usize, content: &str) {
    let Some((key, value)) = content.split_once(':') else {
        return;
    };
    let key = key.trim();
    if key.is_empty() || key.contains('(') {
        return;
    }

    let owner = match stack.iter().rposition(|o| o.indent < indent) {
        Some(i) => &mut stack[i],
        None => &mut stack[0],
    };
    owner
        .node
        .extra
        .insert(key.to_string(), value.trim().to_string());
}

/// EXPLAIN ANALYZE trails the tree with per-document timing summary lines.
fn is_timing_line(content: &str) -> bool {
    ["Planning Time:", "Planning time:", "Execution Time:", "Execution time:"]
        .iter()
        .any(|p| content.starts_with(p))
}

/// Recognizes a line opening a named shared-subplan context and returns
/// the subplan name. `CTE Scan on ...` is a scan node, not an opener.
fn subplan_opener(caption: &str) -> Option<String> {
    for keyword in ["CTE", "InitPlan", "SubPlan"] {
        if let Some(rest) = caption.strip_prefix(keyword)
            && rest.starts_with(' ')
        {
            let name = rest.trim_start().split_whitespace().next()?;
            if name != "Scan" {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Pulls a `(CTE <name>)` / `(InitPlan <name>)` / `(SubPlan <name>)`
/// reference marker out of a caption. Returns the referenced name, if
/// any, and the caption with the marker removed.
fn extract_reference(caption: &str) -> (Option<String>, String) {
    for keyword in ["(CTE ", "(InitPlan ", "(SubPlan "] {
        if let Some(start) = caption.find(keyword)
            && let Some(close_rel) = caption[start..].find(')')
        {
            let name = caption[start + keyword.len()..start + close_rel].trim();
            if !name.is_empty() && !name.contains('(') {
                let mut rest = String::with_capacity(caption.len());
                rest.push_str(&caption[..start]);
                rest.push_str(&caption[start + close_rel + 1..]);
                return (Some(name.to_string()), tidy_label(&rest));
            }
        }
    }
    (None, caption.to_string())
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
