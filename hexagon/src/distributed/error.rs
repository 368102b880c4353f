//! Distributed-execution errors (spec §4.8).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistributedError {
    #[error("executor '{0}' is not registered")]
    UnknownExecutor(String),

    #[error("node '{node}' failed on executor '{executor}': {source}")]
    RemoteExecutionFailed { node: String, executor: String, source: String },

    #[error("node '{node}' failed on executor '{executor}' and fallback is disabled: {source}")]
    NoFallback { node: String, executor: String, source: String },

    #[error("failed to serialize state for node '{0}': {1}")]
    Serialize(String, String),

    #[error("failed to deserialize state from node '{0}': {1}")]
    Deserialize(String, String),

    #[error("transport error calling executor '{executor}': {source}")]
    Transport { executor: String, source: String },

    #[error(transparent)]
    Execution(#[from] crate::execution::ExecutionError),
}
