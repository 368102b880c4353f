//! Graph validation/compilation errors (spec §7 "Validation").
//!
//! Returned by `GraphBuilder::build`/`validate`. Unlike the teacher's
//! `StateGraph` (which only supports a single linear chain), a `GraphBuilder`
//! allows arbitrary conditional fan-out and Pregel-style cycles, so
//! validation here checks edge endpoints and conditional targets rather than
//! "exactly one chain".

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
    #[error("node name '{0}' is reserved")]
    ReservedName(String),

    #[error("node '{0}' is already registered")]
    DuplicateNode(String),

    #[error("edge references unknown node: {0}")]
    NodeNotFound(String),

    #[error("conditional edge on '{from}' references unknown target '{target}'")]
    UnknownConditionalTarget { from: String, target: String },

    #[error("graph has no entry point: no edge from START and none set explicitly")]
    MissingEntryPoint,

    #[error("graph '{0}' has not been compiled")]
    NotCompiled(String),
}
