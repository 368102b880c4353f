//! Execution-time error taxonomy (spec §7 "Execution" and "Scheduling/resource").
//!
//! Handler failures are wrapped with the failing node's name; the state
//! returned alongside an `Err` by callers is always the state *before* that
//! node's update (spec §7 propagation policy) — `ExecutionError` itself
//! never carries state, callers preserve it on their own stack.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("node '{node}' failed: {source}")]
    HandlerFailed { node: String, source: String },

    #[error("node '{0}' has no outgoing edge")]
    NoOutgoingEdge(String),

    #[error("node '{0}' not found in compiled graph")]
    UnknownNode(String),

    #[error("conditional router on node '{node}' returned unknown target '{target}'")]
    UnknownRoutingTarget { node: String, target: String },

    #[error("maximum supersteps ({0}) exceeded")]
    MaxSuperstepsExceeded(u64),

    #[error("run was cancelled: {0}")]
    Cancelled(String),

    #[error("empty graph: no entry point")]
    EmptyGraph,
}

impl ExecutionError {
    pub fn handler_failed(node: impl Into<String>, source: impl std::fmt::Display) -> Self {
        ExecutionError::HandlerFailed {
            node: node.into(),
            source: source.to_string(),
        }
    }
}
