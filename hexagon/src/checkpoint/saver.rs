//! The basic checkpointer contract: save/load/list/delete over a thread.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::model::{Checkpoint, CheckpointListItem};

/// Save/load/list/delete over a thread's checkpoints.
///
/// Invariants every implementation must uphold: `save` assigns an id if
/// absent, sets `updated_at = now`, and preserves `created_at` across
/// re-saves under the same id; `save` stores a deep copy and `load`/`list`
/// return deep copies, so external mutation of inputs or outputs never
/// touches the store; `list` on a missing thread returns an empty result
/// (not an error); `delete`/`delete_thread` on missing targets are
/// idempotent no-ops.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn save(&self, checkpoint: Checkpoint<S>) -> Result<Checkpoint<S>, CheckpointError>;

    /// Loads the most recent checkpoint for `thread_id`. Fails if the thread
    /// has no checkpoints.
    async fn load(&self, thread_id: &str) -> Result<Checkpoint<S>, CheckpointError>;

    async fn load_by_id(&self, checkpoint_id: &str) -> Result<Checkpoint<S>, CheckpointError>;

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    async fn delete(&self, checkpoint_id: &str) -> Result<(), CheckpointError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), CheckpointError>;
}
