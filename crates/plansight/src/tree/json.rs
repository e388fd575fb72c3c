//! JSON structural parser
//!
//! JSON EXPLAIN output already carries the structure explicitly; this
//! walks it 1:1, mapping known keys to the common schema through a fixed
//! alias table and keeping everything else in `extra`. PostgreSQL-style
//! wrappers (a one-element array whose entry holds a `Plan` object) are
//! unwrapped, and children tagged with a `Subplan Name` of the form
//! `CTE <name>` / `InitPlan <name>` are routed into the shared-subplan
//! registry instead of the main tree.

use serde_json::Value;

use crate::error::{MalformedPlanError, Result};
use crate::plan::{ACTUAL_STARTUP_TIME_KEY, NormalizedSource, PlanNode, SharedSubplan};
use crate::tree::{MAX_DEPTH, SubplanRegistry};

/// Alias table for the common schema. First match wins.
const OPERATION_KEYS: &[&str] = &["Node Type", "Operation", "operation"];
const STARTUP_COST_KEYS: &[&str] = &["Startup Cost", "startupCost"];
const TOTAL_COST_KEYS: &[&str] = &["Total Cost", "totalCost"];
const PLAN_ROWS_KEYS: &[&str] = &["Plan Rows", "planRows"];
const ACTUAL_ROWS_KEYS: &[&str] = &["Actual Rows", "actualRows"];
const ACTUAL_TIME_KEYS: &[&str] = &["Actual Total Time", "actualTimeMs"];
const ACTUAL_STARTUP_KEYS: &[&str] = &["Actual Startup Time"];
const LOOPS_KEYS: &[&str] = &["Actual Loops", "loops"];
const CHILDREN_KEYS: &[&str] = &["Plans", "children", "Children"];
const SUBPLAN_NAME_KEY: &str = "Subplan Name";

pub(super) fn build(source: &NormalizedSource) -> Result<(PlanNode, SubplanRegistry)> {
    let value: Value = serde_json::from_str(source.as_str())?;
    let mut registry = SubplanRegistry::new();

    let (node_value, wrapper) = unwrap_root(&value)?;
    let mut root = walk(node_value, 0, &mut registry)?;

    // EXPLAIN ANALYZE wrappers carry document-level timing next to the
    // plan object; keep it on the root for downstream consumers.
    if let Some(wrapper) = wrapper
        && let Some(obj) = wrapper.as_object()
    {
        for key in ["Planning Time", "Execution Time"] {
            if let Some(v) = obj.get(key) {
                root.extra.insert(key.to_string(), scalar_to_string(v));
            }
        }
    }

    Ok((root, registry))
}

/// Peels PostgreSQL-style wrappers: a one-element array and/or an object
/// holding the node under a `Plan` key. Returns the node value and the
/// wrapper object timing fields may live on.
fn unwrap_root(value: &Value) -> Result<(&Value, Option<&Value>)> {
    let candidate = if let Some(arr) = value.as_array() {
        arr.first()
            .ok_or_else(|| MalformedPlanError::InvalidStructure("empty JSON plan array".into()))?
    } else {
        value
    };

    if let Some(plan) = candidate.get("Plan") {
        Ok((plan, Some(candidate)))
    } else {
        Ok((candidate, None))
    }
}

fn walk(value: &Value, depth: usize, registry: &mut SubplanRegistry) -> Result<PlanNode> {
    if depth >= MAX_DEPTH {
        return Err(MalformedPlanError::NestingTooDeep { limit: MAX_DEPTH });
    }

    let obj = value.as_object().ok_or_else(|| {
        MalformedPlanError::InvalidStructure("plan node is not a JSON object".into())
    })?;

    let operation = lookup(obj, OPERATION_KEYS)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            MalformedPlanError::InvalidStructure("plan node is missing an operation label".into())
        })?;

    let mut node = PlanNode::new(operation);
    node.startup_cost = lookup(obj, STARTUP_COST_KEYS).and_then(as_number);
    node.total_cost = lookup(obj, TOTAL_COST_KEYS).and_then(as_number);
    node.plan_rows = lookup(obj, PLAN_ROWS_KEYS).and_then(as_count);
    node.actual_rows = lookup(obj, ACTUAL_ROWS_KEYS).and_then(as_count);
    node.actual_time_ms = lookup(obj, ACTUAL_TIME_KEYS).and_then(as_number);
    node.loops = lookup(obj, LOOPS_KEYS).and_then(as_count).filter(|&n| n > 0);
    if let (Some(startup), Some(total)) = (node.startup_cost, node.total_cost)
        && total < startup
    {
        node.startup_cost = None;
        node.total_cost = None;
    }
    if let Some(startup) = lookup(obj, ACTUAL_STARTUP_KEYS).and_then(as_number) {
        node.extra
            .insert(ACTUAL_STARTUP_TIME_KEY.to_string(), startup.to_string());
    }

    if let Some(children) = lookup(obj, CHILDREN_KEYS) {
        let children = children.as_array().ok_or_else(|| {
            MalformedPlanError::InvalidStructure("children field is not an array".into())
        })?;
        for child_value in children {
            let subplan_name = child_value
                .get(SUBPLAN_NAME_KEY)
                .and_then(Value::as_str)
                .and_then(subplan_name);

            let child = walk(child_value, depth + 1, registry)?;
            match subplan_name {
                Some(name) => {
                    registry.insert(name.clone(), SharedSubplan::new(name, child));
                }
                None => node.children.push(child),
            }
        }
    }

    // Everything not in the common schema is kept verbatim. An `extra`
    // object (our own serialization re-ingested) merges entry by entry.
    for (key, val) in obj {
        if is_known_key(key) {
            continue;
        }
        if key == "extra" && let Some(map) = val.as_object() {
            for (k, v) in map {
                node.extra.insert(k.clone(), scalar_to_string(v));
            }
            continue;
        }
        node.extra.insert(key.clone(), scalar_to_string(val));
    }

    Ok(node)
}

fn lookup<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn is_known_key(key: &str) -> bool {
    OPERATION_KEYS.contains(&key)
        || STARTUP_COST_KEYS.contains(&key)
        || TOTAL_COST_KEYS.contains(&key)
        || PLAN_ROWS_KEYS.contains(&key)
        || ACTUAL_ROWS_KEYS.contains(&key)
        || ACTUAL_TIME_KEYS.contains(&key)
        || ACTUAL_STARTUP_KEYS.contains(&key)
        || LOOPS_KEYS.contains(&key)
        || CHILDREN_KEYS.contains(&key)
        || key == SUBPLAN_NAME_KEY
        || key == "depth"
}

/// Numeric fields arrive as JSON numbers or, from some engines, as
/// quoted strings ("1.00"); accept both.
fn as_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| as_number(value).filter(|v| *v >= 0.0).map(|v| v as u64))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `Subplan Name: "CTE topsellers"` names a shared subplan; plain subplan
/// labels pass through as the registry key.
fn subplan_name(label: &str) -> Option<String> {
    for keyword in ["CTE ", "InitPlan ", "SubPlan "] {
        if let Some(rest) = label.strip_prefix(keyword) {
            let name = rest.split_whitespace().next()?;
            return Some(name.to_string());
        }
    }
    Some(label.to_string())
}
