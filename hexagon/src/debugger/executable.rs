//! `Executable`: the narrow surface the debugger drives a run through.
//!
//! Spec §4.7: "Wraps an `Executable` (ExecuteNode/GetEntryPoint/GetNodeName)
//! rather than the typed graph, to support arbitrary state shapes." Decoupling
//! from `CompiledGraph<S>` directly means the debugger can drive anything
//! that can execute one node at a time and report its own routing, not just
//! this crate's DAG/Pregel graphs.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::debugger::error::DebuggerError;
use crate::execution::ExecutionError;
use crate::graph::{resolve_conditional, AddressSegment, CompiledGraph, Node, NodeOutcome, RunContext, END};

#[async_trait]
pub trait Executable<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn entry_point(&self) -> &str;

    fn node_name(&self, node_id: &str) -> Option<String>;

    /// Runs exactly one node, returning its output state.
    async fn execute_node(&self, node_id: &str, state: S) -> Result<S, DebuggerError>;

    /// The node to run after `node_id` given the state it just produced, or
    /// `None` once the run has reached the end.
    fn next_node(&self, node_id: &str, state: &S) -> Option<String>;
}

/// Lets the debugger drive any compiled graph directly, following the same
/// conditional-routing rule the DAG executor uses (first resolving group
/// wins, else the first plain successor).
#[async_trait]
impl<S> Executable<S> for CompiledGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn entry_point(&self) -> &str {
        CompiledGraph::entry_point(self)
    }

    fn node_name(&self, node_id: &str) -> Option<String> {
        self.node(node_id).map(|n| n.name().to_string())
    }

    async fn execute_node(&self, node_id: &str, state: S) -> Result<S, DebuggerError> {
        let node = self
            .node(node_id)
            .ok_or_else(|| DebuggerError::NodeFailed(node_id.to_string(), "node not found".to_string()))?
            .clone();
        let ctx: RunContext<S> = RunContext::new(crate::checkpoint::RunnableConfig::default()).with_segment(AddressSegment::node(node_id));
        match node.run(state, &ctx).await {
            Ok(NodeOutcome::Next(s)) => Ok(s),
            Ok(NodeOutcome::Interrupt { state, .. }) => Ok(state),
            Err(ExecutionError::HandlerFailed { node, source }) => Err(DebuggerError::NodeFailed(node, source)),
            Err(err) => Err(DebuggerError::NodeFailed(node_id.to_string(), err.to_string())),
        }
    }

    fn next_node(&self, node_id: &str, state: &S) -> Option<String> {
        if let Some(groups) = self.conditional_edges_for(node_id) {
            if let Some(target) = resolve_conditional(groups, state) {
                return if target == END { None } else { Some(target) };
            }
        }
        self.first_plain_successor(node_id).filter(|t| *t != END).map(|s| s.to_string())
    }
}
