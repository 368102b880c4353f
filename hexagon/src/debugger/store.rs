//! Pluggable snapshot storage (spec §4.7 "snapshot storage is pluggable").
//!
//! `InMemorySnapshotStore` is the only implementation this crate ships,
//! mirroring the checkpoint module's `MemorySaver`: a `Mutex`-guarded `Vec`
//! bounded by `max_history`, FIFO-evicting and renumbering on overflow so
//! indices stay contiguous and `parent_index` invariants keep holding.

use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::debugger::error::DebuggerError;
use crate::debugger::model::Snapshot;

#[async_trait]
pub trait SnapshotStore<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Appends a snapshot, assigning it the next contiguous index. Evicts
    /// the oldest entry and renumbers the rest if this push would exceed
    /// the store's bound.
    async fn save(&self, snapshot: Snapshot<S>) -> Snapshot<S>;

    async fn load(&self, index: usize) -> Option<Snapshot<S>>;

    async fn load_range(&self, start: usize, end: usize) -> Vec<Snapshot<S>>;

    async fn delete(&self, index: usize) -> Result<(), DebuggerError>;

    async fn clear(&self);

    async fn len(&self) -> usize;

    async fn all(&self) -> Vec<Snapshot<S>>;

    /// Replaces the entire history (used by `Import`).
    async fn replace_all(&self, snapshots: Vec<Snapshot<S>>);
}

pub struct InMemorySnapshotStore<S> {
    max_history: usize,
    entries: Mutex<Vec<Snapshot<S>>>,
}

impl<S> InMemorySnapshotStore<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<S> SnapshotStore<S> for InMemorySnapshotStore<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn save(&self, mut snapshot: Snapshot<S>) -> Snapshot<S> {
        let mut entries = self.entries.lock().await;
        snapshot.index = entries.len();
        entries.push(snapshot.clone());

        if entries.len() > self.max_history {
            entries.remove(0);
            for entry in entries.iter_mut() {
                entry.index -= 1;
                entry.parent_index = entry.parent_index.and_then(|p| p.checked_sub(1));
            }
            snapshot = entries.last().expect("just pushed at least one entry").clone();
        }
        snapshot
    }

    async fn load(&self, index: usize) -> Option<Snapshot<S>> {
        self.entries.lock().await.get(index).cloned()
    }

    async fn load_range(&self, start: usize, end: usize) -> Vec<Snapshot<S>> {
        let entries = self.entries.lock().await;
        let end = end.min(entries.len());
        if start >= end {
            return Vec::new();
        }
        entries[start..end].to_vec()
    }

    async fn delete(&self, index: usize) -> Result<(), DebuggerError> {
        let mut entries = self.entries.lock().await;
        if index >= entries.len() {
            return Err(DebuggerError::IndexOutOfRange(index));
        }
        entries.remove(index);
        Ok(())
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn all(&self) -> Vec<Snapshot<S>> {
        self.entries.lock().await.clone()
    }

    async fn replace_all(&self, snapshots: Vec<Snapshot<S>>) {
        *self.entries.lock().await = snapshots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_eviction_renumbers_remaining_indices() {
        let store: InMemorySnapshotStore<i32> = InMemorySnapshotStore::new(2);
        store.save(Snapshot::root("n0", "n0", 0)).await;
        store.save(Snapshot::root("n1", "n1", 1)).await;
        store.save(Snapshot::root("n2", "n2", 2)).await;

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].index, 0);
        assert_eq!(all[0].node_id, "n1");
        assert_eq!(all[1].index, 1);
        assert_eq!(all[1].node_id, "n2");
    }

    #[tokio::test]
    async fn delete_out_of_range_is_an_error() {
        let store: InMemorySnapshotStore<i32> = InMemorySnapshotStore::new(10);
        let err = store.delete(0).await.unwrap_err();
        assert!(matches!(err, DebuggerError::IndexOutOfRange(0)));
    }
}
