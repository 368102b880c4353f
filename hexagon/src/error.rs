//! Top-level error aggregate.
//!
//! Per-subsystem errors (`GraphError`, `ExecutionError`, `CheckpointError`,
//! `HitlError`, `LoopError`, `RunnableError`, `DistributedError`) are the
//! primary types callers match on; `HexagonError` only exists at the seams
//! where subsystems interact and a caller wants one error type to bubble up
//! through, the way `CheckpointRunner`'s `RunnerError` composes execution
//! and persistence errors but for the whole crate.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::distributed::DistributedError;
use crate::execution::ExecutionError;
use crate::graph::GraphError;
use crate::hitl::HitlError;
use crate::loops::LoopError;
use crate::runnable::RunnableError;

#[derive(Debug, Error)]
pub enum HexagonError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Hitl(#[from] HitlError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error(transparent)]
    Runnable(#[from] RunnableError),

    #[error(transparent)]
    Distributed(#[from] DistributedError),
}
