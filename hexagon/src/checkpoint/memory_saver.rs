//! In-memory checkpointer: map-based storage guarded by a read/write lock.
//!
//! Grounded in the teacher's `MemorySaver` (`memory/mod.rs` table: "Dev,
//! tests"), extended to also implement [`EnhancedCheckpointer`] since it's
//! the natural backend for tests exercising branches/history/search/cleanup
//! without a filesystem or remote store.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::checkpoint::enhanced::EnhancedCheckpointer;
use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::model::{
    Branch, Checkpoint, CheckpointListItem, CheckpointStatus, CleanupPolicy, EnhancedCheckpoint, MergeStrategy, SearchQuery,
};
use crate::checkpoint::saver::Checkpointer;

struct Inner<S> {
    checkpoints: HashMap<String, EnhancedCheckpoint<S>>,
    /// thread_id -> checkpoint ids in insertion order (no duplicates).
    thread_index: HashMap<String, Vec<String>>,
    branches: HashMap<String, Branch>,
    next_id: u64,
}

pub struct MemorySaver<S> {
    inner: RwLock<Inner<S>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                checkpoints: HashMap::new(),
                thread_index: HashMap::new(),
                branches: HashMap::new(),
                next_id: 0,
            }),
        }
    }
}

impl<S> MemorySaver<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_list_item<S>(e: &EnhancedCheckpoint<S>) -> CheckpointListItem {
    CheckpointListItem {
        checkpoint_id: e.base.id.clone(),
        status: e.status,
        created_at: e.base.created_at,
        parent_id: e.base.parent_id.clone(),
    }
}

fn matches<S>(e: &EnhancedCheckpoint<S>, query: &SearchQuery) -> bool {
    if let Some(t) = &query.thread_id {
        if &e.base.thread_id != t {
            return false;
        }
    }
    if let Some(g) = &query.graph_name {
        if &e.base.graph_name != g {
            return false;
        }
    }
    if let Some(s) = query.status {
        if e.status != s {
            return false;
        }
    }
    if let Some(b) = &query.branch_id {
        if e.branch_id.as_deref() != Some(b.as_str()) {
            return false;
        }
    }
    if !query.tags.iter().all(|t| e.tags.contains(t)) {
        return false;
    }
    if let Some((start, end)) = query.time_range {
        if e.base.created_at < start || e.base.created_at > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn save(&self, mut checkpoint: Checkpoint<S>) -> Result<Checkpoint<S>, CheckpointError> {
        let mut guard = self.inner.write().await;
        let now = SystemTime::now();

        if checkpoint.id.is_empty() {
            guard.next_id += 1;
            checkpoint.id = format!("cp-{}", guard.next_id);
        }

        let created_at = guard
            .checkpoints
            .get(&checkpoint.id)
            .map(|e| e.base.created_at)
            .unwrap_or(checkpoint.created_at);
        checkpoint.created_at = created_at;
        checkpoint.updated_at = now;

        let thread_id = checkpoint.thread_id.clone();
        let id = checkpoint.id.clone();

        let entry = guard
            .checkpoints
            .get(&id)
            .map(|existing| {
                let mut e = existing.clone();
                e.base = checkpoint.clone();
                e
            })
            .unwrap_or_else(|| EnhancedCheckpoint::from_base(checkpoint.clone(), String::new()));
        guard.checkpoints.insert(id.clone(), entry);

        let index = guard.thread_index.entry(thread_id).or_default();
        if !index.contains(&id) {
            index.push(id);
        }

        Ok(checkpoint)
    }

    async fn load(&self, thread_id: &str) -> Result<Checkpoint<S>, CheckpointError> {
        let guard = self.inner.read().await;
        let ids = guard
            .thread_index
            .get(thread_id)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| CheckpointError::ThreadNotFound(thread_id.to_string()))?;
        let latest = ids.last().expect("checked non-empty above");
        guard
            .checkpoints
            .get(latest)
            .map(|e| e.base.clone())
            .ok_or_else(|| CheckpointError::CheckpointNotFound(latest.clone()))
    }

    async fn load_by_id(&self, checkpoint_id: &str) -> Result<Checkpoint<S>, CheckpointError> {
        let guard = self.inner.read().await;
        guard
            .checkpoints
            .get(checkpoint_id)
            .map(|e| e.base.clone())
            .ok_or_else(|| CheckpointError::CheckpointNotFound(checkpoint_id.to_string()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let guard = self.inner.read().await;
        Ok(guard
            .thread_index
            .get(thread_id)
            .into_iter()
            .flatten()
            .filter_map(|id| guard.checkpoints.get(id))
            .map(to_list_item)
            .collect())
    }

    async fn delete(&self, checkpoint_id: &str) -> Result<(), CheckpointError> {
        let mut guard = self.inner.write().await;
        guard.checkpoints.remove(checkpoint_id);
        for ids in guard.thread_index.values_mut() {
            ids.retain(|id| id != checkpoint_id);
        }
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), CheckpointError> {
        let mut guard = self.inner.write().await;
        if let Some(ids) = guard.thread_index.remove(thread_id) {
            for id in ids {
                guard.checkpoints.remove(&id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S> EnhancedCheckpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn save_enhanced(&self, mut checkpoint: EnhancedCheckpoint<S>) -> Result<EnhancedCheckpoint<S>, CheckpointError> {
        let saved_base = self.save(checkpoint.base.clone()).await?;
        checkpoint.base = saved_base;
        let mut guard = self.inner.write().await;
        guard.checkpoints.insert(checkpoint.base.id.clone(), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn load_enhanced(&self, thread_id: &str) -> Result<EnhancedCheckpoint<S>, CheckpointError> {
        let guard = self.inner.read().await;
        let ids = guard
            .thread_index
            .get(thread_id)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| CheckpointError::ThreadNotFound(thread_id.to_string()))?;
        let latest = ids.last().expect("checked non-empty above");
        guard
            .checkpoints
            .get(latest)
            .cloned()
            .ok_or_else(|| CheckpointError::CheckpointNotFound(latest.clone()))
    }

    async fn load_enhanced_by_id(&self, checkpoint_id: &str) -> Result<EnhancedCheckpoint<S>, CheckpointError> {
        let guard = self.inner.read().await;
        guard
            .checkpoints
            .get(checkpoint_id)
            .cloned()
            .ok_or_else(|| CheckpointError::CheckpointNotFound(checkpoint_id.to_string()))
    }

    async fn list_enhanced(&self, query: &SearchQuery) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        self.search(query).await
    }

    async fn get_history(&self, checkpoint_id: &str, limit: usize) -> Result<Vec<EnhancedCheckpoint<S>>, CheckpointError> {
        let guard = self.inner.read().await;
        let mut history = Vec::new();
        let mut current = Some(checkpoint_id.to_string());
        while let Some(id) = current {
            if history.len() >= limit {
                break;
            }
            let entry = guard
                .checkpoints
                .get(&id)
                .ok_or_else(|| CheckpointError::CheckpointNotFound(id.clone()))?;
            history.push(entry.clone());
            current = entry.base.parent_id.clone();
        }
        Ok(history)
    }

    async fn get_branches(&self, thread_id: &str) -> Result<Vec<Branch>, CheckpointError> {
        let guard = self.inner.read().await;
        Ok(guard
            .branches
            .values()
            .filter(|b| b.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn create_branch(&self, checkpoint_id: &str, name: &str) -> Result<Branch, CheckpointError> {
        let mut guard = self.inner.write().await;
        let base = guard
            .checkpoints
            .get(checkpoint_id)
            .cloned()
            .ok_or_else(|| CheckpointError::CheckpointNotFound(checkpoint_id.to_string()))?;

        guard.next_id += 1;
        let branch_id = format!("branch-{}", guard.next_id);
        guard.next_id += 1;
        let child_id = format!("cp-{}", guard.next_id);

        let now = SystemTime::now();
        let mut child = base.clone();
        child.base.id = child_id.clone();
        child.base.parent_id = Some(checkpoint_id.to_string());
        child.base.created_at = now;
        child.base.updated_at = now;
        child.status = CheckpointStatus::Pending;
        child.branch_id = Some(branch_id.clone());
        child.branch_name = Some(name.to_string());

        let thread_id = child.base.thread_id.clone();
        guard.checkpoints.insert(child_id.clone(), child);
        guard.thread_index.entry(thread_id.clone()).or_default().push(child_id.clone());

        let branch = Branch {
            id: branch_id.clone(),
            name: name.to_string(),
            thread_id,
            base_checkpoint_id: checkpoint_id.to_string(),
            latest_checkpoint_id: child_id,
            count: 1,
            created_at: now,
            updated_at: now,
        };
        guard.branches.insert(branch_id, branch.clone());
        Ok(branch)
    }

    async fn merge_branch(
        &self,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> Result<EnhancedCheckpoint<S>, CheckpointError> {
        let mut guard = self.inner.write().await;
        let source_cp = guard
            .checkpoints
            .get(source)
            .cloned()
            .ok_or_else(|| CheckpointError::CheckpointNotFound(source.to_string()))?;
        let target_cp = guard
            .checkpoints
            .get(target)
            .cloned()
            .ok_or_else(|| CheckpointError::CheckpointNotFound(target.to_string()))?;

        guard.next_id += 1;
        let merged_id = format!("cp-{}", guard.next_id);
        let now = SystemTime::now();

        let mut merged = target_cp.clone();
        if strategy == MergeStrategy::Overwrite || strategy == MergeStrategy::Merge {
            merged.base.state = source_cp.base.state.clone();
        }
        merged.base.id = merged_id.clone();
        merged.base.parent_id = Some(target_cp.base.id.clone());
        merged.base.created_at = now;
        merged.base.updated_at = now;
        let mut completed: Vec<String> = target_cp.base.completed_nodes.clone();
        for n in &source_cp.base.completed_nodes {
            if !completed.contains(n) {
                completed.push(n.clone());
            }
        }
        merged.base.completed_nodes = completed;

        let thread_id = target_cp.base.thread_id.clone();
        guard.checkpoints.insert(merged_id.clone(), merged.clone());
        guard.thread_index.entry(thread_id).or_default().push(merged_id);

        Ok(merged)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let guard = self.inner.read().await;
        let mut results: Vec<&EnhancedCheckpoint<S>> = guard.checkpoints.values().filter(|e| matches(e, query)).collect();
        results.sort_by_key(|e| e.base.created_at);
        let offset = query.offset.unwrap_or(0);
        let items: Vec<CheckpointListItem> = results
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(to_list_item)
            .collect();
        Ok(items)
    }

    async fn cleanup(&self, policy: &CleanupPolicy) -> Result<u64, CheckpointError> {
        let mut guard = self.inner.write().await;
        let branch_heads: std::collections::HashSet<String> =
            guard.branches.values().map(|b| b.latest_checkpoint_id.clone()).collect();
        let now = SystemTime::now();

        let mut to_delete = Vec::new();
        for (id, entry) in guard.checkpoints.iter() {
            let age = now.duration_since(entry.base.updated_at).unwrap_or_default();
            let too_old = policy.max_age.map(|max| age > max).unwrap_or(false);
            if !too_old {
                continue;
            }
            if policy.keep_completed && entry.status == CheckpointStatus::Completed {
                continue;
            }
            if policy.keep_branch_heads && branch_heads.contains(id) {
                continue;
            }
            if policy.keep_tagged && !entry.tags.is_empty() {
                continue;
            }
            to_delete.push(id.clone());
        }

        for id in &to_delete {
            guard.checkpoints.remove(id);
            for ids in guard.thread_index.values_mut() {
                ids.retain(|existing| existing != id);
            }
        }
        Ok(to_delete.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_assigns_id_and_preserves_created_at_across_resave() {
        let saver = MemorySaver::<i32>::new();
        let cp = Checkpoint::new("t1", "g", "a", 1);
        let saved = saver.save(cp).await.unwrap();
        assert!(!saved.id.is_empty());
        let first_created = saved.created_at;

        let mut second = saved.clone();
        second.state = 2;
        let resaved = saver.save(second).await.unwrap();
        assert_eq!(resaved.created_at, first_created);
        assert!(resaved.updated_at >= first_created);

        let items = saver.list("t1").await.unwrap();
        assert_eq!(items.len(), 1, "re-save must not duplicate the thread index entry");
    }

    #[tokio::test]
    async fn load_on_empty_thread_fails_list_returns_empty() {
        let saver = MemorySaver::<i32>::new();
        assert!(saver.load("missing").await.is_err());
        assert_eq!(saver.list("missing").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let saver = MemorySaver::<i32>::new();
        saver.delete("nope").await.unwrap();
        saver.delete("nope").await.unwrap();
        saver.delete_thread("nope").await.unwrap();
    }

    #[tokio::test]
    async fn create_branch_forks_pending_child() {
        let saver = MemorySaver::<i32>::new();
        let cp = saver.save(Checkpoint::new("t1", "g", "a", 1)).await.unwrap();
        let enhanced = saver
            .save_enhanced(EnhancedCheckpoint::from_base(cp.clone(), "hash".into()))
            .await
            .unwrap();
        let branch = saver.create_branch(&enhanced.base.id, "exp").await.unwrap();
        let child = saver.load_enhanced_by_id(&branch.latest_checkpoint_id).await.unwrap();
        assert_eq!(child.status, CheckpointStatus::Pending);
        assert_eq!(child.branch_name.as_deref(), Some("exp"));
    }

    #[tokio::test]
    async fn history_walk_terminates_at_root() {
        let saver = MemorySaver::<i32>::new();
        let cp = saver.save(Checkpoint::new("t1", "g", "a", 1)).await.unwrap();
        let enhanced = saver
            .save_enhanced(EnhancedCheckpoint::from_base(cp, "hash".into()))
            .await
            .unwrap();
        let branch = saver.create_branch(&enhanced.base.id, "exp").await.unwrap();
        let history = saver.get_history(&branch.latest_checkpoint_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.last().unwrap().base.parent_id.is_none());
    }
}
