//! Snapshot data model (spec §3 "Snapshot", §4.7).

use std::time::{Duration, SystemTime};

/// One per-step record captured by the time-travel debugger: which node ran,
/// the state before and after it, and where this snapshot sits in the
/// history chain (`parent_index`) and, after a replay, which branch it
/// belongs to.
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    pub index: usize,
    pub timestamp: SystemTime,
    pub node_id: String,
    pub node_name: String,
    /// Deep-cloned state as of entering `node_id`.
    pub state: S,
    /// The node's output state, absent for the synthetic `__start__` entry
    /// and for a node that errored.
    pub output: Option<S>,
    pub error: Option<String>,
    pub duration: Duration,
    /// `Index - 1` for every non-root entry (spec invariant); `None` only
    /// for the first snapshot of a run.
    pub parent_index: Option<usize>,
    /// Tags an alternate execution produced by `Replay`/`ReplayFrom`.
    pub branch_id: Option<String>,
}

impl<S> Snapshot<S> {
    pub fn root(node_id: impl Into<String>, node_name: impl Into<String>, state: S) -> Self {
        Self {
            index: 0,
            timestamp: SystemTime::now(),
            node_id: node_id.into(),
            node_name: node_name.into(),
            state,
            output: None,
            error: None,
            duration: Duration::ZERO,
            parent_index: None,
            branch_id: None,
        }
    }
}

/// One field-level difference between two snapshots' canonical (JSON)
/// encoding, produced by `Compare`.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    Added { field: String, value: serde_json::Value },
    Removed { field: String, value: serde_json::Value },
    Changed { field: String, before: serde_json::Value, after: serde_json::Value },
}
