//! Checkpoint data model: basic checkpoints, the enhanced superset, branches,
//! and the supporting value types (status, merge strategy, cleanup policy,
//! search query).
//!
//! Generalizes the teacher's `Checkpoint<S>` (`memory/checkpoint.rs`, which
//! only carried `channel_values`/`channel_versions`) with the full
//! thread/graph/interrupt bookkeeping a resumable run needs.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// One persisted snapshot of a graph run.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    pub thread_id: String,
    pub graph_name: String,
    pub current_node: String,
    pub state: S,
    pub pending_nodes: Vec<String>,
    pub completed_nodes: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Hierarchical address of any in-flight interrupt, keyed by node name.
    pub interrupt_address: HashMap<String, String>,
    pub interrupt_state: HashMap<String, serde_json::Value>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub parent_id: Option<String>,
}

impl<S> Checkpoint<S> {
    pub fn new(thread_id: impl Into<String>, graph_name: impl Into<String>, current_node: impl Into<String>, state: S) -> Self {
        let now = SystemTime::now();
        Self {
            id: String::new(),
            thread_id: thread_id.into(),
            graph_name: graph_name.into(),
            current_node: current_node.into(),
            state,
            pending_nodes: Vec::new(),
            completed_nodes: Vec::new(),
            metadata: HashMap::new(),
            interrupt_address: HashMap::new(),
            interrupt_state: HashMap::new(),
            created_at: now,
            updated_at: now,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Interrupted,
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointStats {
    pub step_count: u64,
    pub node_durations: HashMap<String, Duration>,
    pub token_counters: HashMap<String, u64>,
    pub tool_counters: HashMap<String, u64>,
}

/// Superset of [`Checkpoint`] adding version, status, branch lineage, tags,
/// execution stats, and a content hash/diff vs its parent.
#[derive(Debug, Clone)]
pub struct EnhancedCheckpoint<S> {
    pub base: Checkpoint<S>,
    pub version: String,
    pub status: CheckpointStatus,
    pub child_ids: Vec<String>,
    pub branch_id: Option<String>,
    pub branch_name: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub stats: CheckpointStats,
    pub state_hash: String,
    pub state_diff: Option<serde_json::Value>,
}

impl<S> EnhancedCheckpoint<S> {
    pub fn from_base(base: Checkpoint<S>, state_hash: String) -> Self {
        Self {
            base,
            version: "1.0.0".to_string(),
            status: CheckpointStatus::Pending,
            child_ids: Vec::new(),
            branch_id: None,
            branch_name: None,
            tags: Vec::new(),
            description: None,
            stats: CheckpointStats::default(),
            state_hash,
            state_diff: None,
        }
    }
}

/// A named alternate line of checkpoints forked from a base checkpoint.
#[derive(Debug, Clone)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub thread_id: String,
    pub base_checkpoint_id: String,
    pub latest_checkpoint_id: String,
    pub count: u64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Overwrite,
    Merge,
    KeepBoth,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupPolicy {
    pub max_age: Option<Duration>,
    pub keep_completed: bool,
    pub keep_branch_heads: bool,
    pub keep_tagged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub thread_id: Option<String>,
    pub graph_name: Option<String>,
    pub status: Option<CheckpointStatus>,
    pub branch_id: Option<String>,
    /// All listed tags must be present on a matching checkpoint.
    pub tags: Vec<String>,
    pub time_range: Option<(SystemTime, SystemTime)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One entry of a history walk or search result.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub status: CheckpointStatus,
    pub created_at: SystemTime,
    pub parent_id: Option<String>,
}
