//! Streaming events emitted while a graph runs.
//!
//! `StreamEvent` carries both the DAG executor's per-node vocabulary
//! (`NodeStart`/`NodeEnd`/`Error`/`End`) and the Pregel executor's superstep
//! vocabulary (`SuperstepStart`/`SuperstepEnd`/`Complete`/`Error`) in one
//! enum so both executors share a channel type; `StreamMode` stays as a
//! filter a caller can use to restrict which payload shape it wants, the
//! same role it plays in the teacher's `CompiledStateGraph::stream`.

use std::fmt::Debug;

/// Stream mode selector: which kinds of events a caller wants to see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node/superstep completes.
    Values,
    /// Emit incremental per-node updates.
    Updates,
    /// Emit message chunks (reserved for streaming-capable node handlers).
    Messages,
    /// Emit custom JSON payloads from nodes.
    Custom,
}

#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    NodeStart(String),
    NodeEnd { node: String, state: S },
    SuperstepStart { step: u64, active: Vec<String> },
    SuperstepEnd { step: u64, state: S },
    Custom(serde_json::Value),
    Error(String),
    End(S),
}
