//! Plansight - EXPLAIN plan parsing
//!
//! This crate turns raw, human-readable EXPLAIN output into a normalized,
//! strongly-typed plan tree. It understands three input shapes:
//! - indented text trees (PostgreSQL-style `->` markers or plain indentation)
//! - JSON trees (EXPLAIN (FORMAT JSON) and friends)
//! - tabular output (one row per operation, `|`-separated columns)
//!
//! The pipeline is normalize → detect dialect → build tree → assemble, and
//! [`parse_plan`] runs all of it in one call:
//!
//! ```
//! use plansight::parse_plan;
//!
//! let doc = parse_plan("-> Limit: 5 row(s)  (cost=0.00..10.00 rows=5)", None).unwrap();
//! assert!(doc.root.operation.contains("Limit"));
//! assert_eq!(doc.root.total_cost, Some(10.0));
//! ```
//!
//! Parsing is synchronous, pure, and touches no I/O; every call builds a
//! fresh document and failed parses never yield a partial tree.

pub mod assemble;
pub mod dialect;
pub mod error;
pub mod normalize;
pub mod plan;
pub mod stats;
pub mod table;
pub mod tree;

pub use assemble::{assemble, parse_plan};
pub use dialect::{Dialect, detect};
pub use error::{MalformedPlanError, Result};
pub use normalize::normalize;
pub use plan::{NormalizedSource, PlanDocument, PlanNode, PlanNodeIterator, SharedSubplan};
pub use stats::{NodeStats, extract_stats};
pub use table::render_table;
pub use tree::{MAX_DEPTH, SubplanRegistry, build};
