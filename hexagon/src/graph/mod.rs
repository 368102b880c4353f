//! Graph data model and compilation: nodes, edges, conditional routing,
//! loop-back expansion, node placement, and the compiled execution plan.
//!
//! `GraphBuilder` assembles a graph declaratively; `GraphBuilder::build`
//! validates it and produces a `CompiledGraph`, which the `executor` module
//! actually runs.

mod builder;
mod compile_error;
mod compiled;
mod conditional;
mod edge;
mod node;
mod placement;
mod plan;
mod run_context;

pub use builder::{GraphBuilder, END, START};
pub use compile_error::GraphError;
pub use compiled::{CompiledGraph, GraphStats};
pub use conditional::{resolve_conditional, ConditionalEdgeGroup, Router};
pub use edge::{Edge, EdgeKind};
pub use node::{node_fn, FnNode, Node, NodeKind, NodeOutcome};
pub use placement::NodePlacement;
pub use plan::{build_plan, static_adjacency_from_edges, ExecutionPlan};
pub use run_context::{AddressSegment, RunContext};
