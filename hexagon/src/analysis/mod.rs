//! Compiler analysis & visualization (spec §4.10): the execution plan and
//! aggregate statistics are computed by the graph module itself
//! (`CompiledGraph::plan`/`stats`); this module is the rendering surface on
//! top of them — Mermaid, Graphviz DOT, and ASCII exports.

mod visualize;

pub use crate::graph::GraphStats;
pub use visualize::{to_ascii, to_dot, to_mermaid, Direction, VisualizeOptions};
