//! Enhanced checkpointer contract: branches, history, search, cleanup.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::model::{Branch, CheckpointListItem, CleanupPolicy, EnhancedCheckpoint, MergeStrategy, SearchQuery};
use crate::checkpoint::saver::Checkpointer;

#[async_trait]
pub trait EnhancedCheckpointer<S>: Checkpointer<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn save_enhanced(&self, checkpoint: EnhancedCheckpoint<S>) -> Result<EnhancedCheckpoint<S>, CheckpointError>;

    async fn load_enhanced(&self, thread_id: &str) -> Result<EnhancedCheckpoint<S>, CheckpointError>;

    async fn load_enhanced_by_id(&self, checkpoint_id: &str) -> Result<EnhancedCheckpoint<S>, CheckpointError>;

    async fn list_enhanced(&self, query: &SearchQuery) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Walks parent links from `checkpoint_id`, newest first, up to `limit`.
    async fn get_history(&self, checkpoint_id: &str, limit: usize) -> Result<Vec<EnhancedCheckpoint<S>>, CheckpointError>;

    async fn get_branches(&self, thread_id: &str) -> Result<Vec<Branch>, CheckpointError>;

    /// Forks a new pending child checkpoint from `checkpoint_id` whose state
    /// is a copy and whose branch id is freshly generated.
    async fn create_branch(&self, checkpoint_id: &str, name: &str) -> Result<Branch, CheckpointError>;

    /// Creates a successor checkpoint on `target` combining it with `source`
    /// per `strategy`; completed-node sets are always union-merged.
    async fn merge_branch(
        &self,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> Result<EnhancedCheckpoint<S>, CheckpointError>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Removes checkpoints older than `policy.max_age`, respecting retention
    /// flags. Returns the number of checkpoints removed.
    async fn cleanup(&self, policy: &CleanupPolicy) -> Result<u64, CheckpointError>;
}
