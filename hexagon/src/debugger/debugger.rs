//! `TimeTravelDebugger`: runs an `Executable`, recording one snapshot per
//! node, then lets a caller navigate, replay, diff, and export that history
//! (spec §4.7).

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::debugger::error::DebuggerError;
use crate::debugger::executable::Executable;
use crate::debugger::model::{DiffEntry, Snapshot};
use crate::debugger::store::SnapshotStore;

const START_NODE_ID: &str = "__start__";
const END_NODE_ID: &str = "__end__";

pub struct TimeTravelDebugger<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    executable: Arc<dyn Executable<S>>,
    store: Arc<dyn SnapshotStore<S>>,
    cursor: RwLock<usize>,
    branch_counter: std::sync::atomic::AtomicU64,
}

impl<S> TimeTravelDebugger<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(executable: Arc<dyn Executable<S>>, store: Arc<dyn SnapshotStore<S>>) -> Self {
        Self {
            executable,
            store,
            cursor: RwLock::new(0),
            branch_counter: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Runs from the entry point to completion, emitting a `__start__`
    /// snapshot, one per node, then a final `__end__` snapshot.
    pub async fn run(&self, state0: S) -> Result<S, DebuggerError> {
        self.store.clear().await;
        self.store.save(Snapshot::root(START_NODE_ID, START_NODE_ID, state0.clone())).await;

        let mut current = self.executable.entry_point().to_string();
        let mut state = state0;

        loop {
            let node_name = self.executable.node_name(&current).unwrap_or_else(|| current.clone());
            let t0 = Instant::now();
            let input_state = state.clone();
            let result = self.executable.execute_node(&current, state.clone()).await;
            let snapshot_index_before = self.store.len().await;

            match result {
                Ok(output) => {
                    self.store
                        .save(Snapshot {
                            index: 0,
                            timestamp: SystemTime::now(),
                            node_id: current.clone(),
                            node_name,
                            state: input_state,
                            output: Some(output.clone()),
                            error: None,
                            duration: t0.elapsed(),
                            parent_index: Some(snapshot_index_before.saturating_sub(1)),
                            branch_id: None,
                        })
                        .await;
                    let next = self.executable.next_node(&current, &output);
                    state = output;
                    match next {
                        Some(n) => current = n,
                        None => break,
                    }
                }
                Err(err) => {
                    self.store
                        .save(Snapshot {
                            index: 0,
                            timestamp: SystemTime::now(),
                            node_id: current.clone(),
                            node_name,
                            state: input_state,
                            output: None,
                            error: Some(err.to_string()),
                            duration: t0.elapsed(),
                            parent_index: Some(snapshot_index_before.saturating_sub(1)),
                            branch_id: None,
                        })
                        .await;
                    return Err(err);
                }
            }
        }

        let end_index = self.store.len().await;
        self.store
            .save(Snapshot::root(END_NODE_ID, END_NODE_ID, state.clone()).tap_parent(end_index.saturating_sub(1)))
            .await;
        *self.cursor.write().await = self.store.len().await.saturating_sub(1);
        Ok(state)
    }

    pub async fn current_index(&self) -> usize {
        *self.cursor.read().await
    }

    pub async fn go_to(&self, index: usize) -> Result<Snapshot<S>, DebuggerError> {
        let snapshot = self.store.load(index).await.ok_or(DebuggerError::IndexOutOfRange(index))?;
        *self.cursor.write().await = index;
        Ok(snapshot)
    }

    pub async fn go_back(&self) -> Result<Snapshot<S>, DebuggerError> {
        let current = *self.cursor.read().await;
        let target = current.checked_sub(1).ok_or(DebuggerError::IndexOutOfRange(0))?;
        self.go_to(target).await
    }

    pub async fn go_forward(&self) -> Result<Snapshot<S>, DebuggerError> {
        let current = *self.cursor.read().await;
        self.go_to(current + 1).await
    }

    /// Re-executes from the current cursor position. Fresh snapshots are
    /// tagged with a new `branch_id` so the original history and the replay
    /// can both be inspected afterward.
    pub async fn replay(&self) -> Result<S, DebuggerError> {
        let index = *self.cursor.read().await;
        let from = self.store.load(index).await.ok_or(DebuggerError::IndexOutOfRange(index))?;
        let branch_id = format!(
            "branch-{}-{}",
            index,
            self.branch_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
        );

        let mut current = from.node_id.clone();
        let mut state = from.output.clone().unwrap_or_else(|| from.state.clone());
        let mut parent = index;

        if current == END_NODE_ID {
            return Ok(state);
        }
        if current == START_NODE_ID {
            current = self.executable.entry_point().to_string();
        } else {
            let Some(next) = self.executable.next_node(&current, &state) else {
                return Ok(state);
            };
            current = next;
        }

        loop {
            let node_name = self.executable.node_name(&current).unwrap_or_else(|| current.clone());
            let t0 = Instant::now();
            let input_state = state.clone();
            let output = self.executable.execute_node(&current, state.clone()).await?;
            let saved = self
                .store
                .save(Snapshot {
                    index: 0,
                    timestamp: SystemTime::now(),
                    node_id: current.clone(),
                    node_name,
                    state: input_state,
                    output: Some(output.clone()),
                    error: None,
                    duration: t0.elapsed(),
                    parent_index: Some(parent),
                    branch_id: Some(branch_id.clone()),
                })
                .await;
            parent = saved.index;
            let next = self.executable.next_node(&current, &output);
            state = output;
            match next {
                Some(n) => current = n,
                None => break,
            }
        }

        *self.cursor.write().await = parent;
        Ok(state)
    }

    pub async fn replay_from(&self, index: usize) -> Result<S, DebuggerError> {
        self.go_to(index).await?;
        self.replay().await
    }

    pub async fn get_branches(&self) -> Vec<String> {
        let mut branches: Vec<String> = self.store.all().await.into_iter().filter_map(|s| s.branch_id).collect();
        branches.sort();
        branches.dedup();
        branches
    }

    pub async fn get_branch_history(&self, branch_id: &str) -> Vec<Snapshot<S>> {
        self.store.all().await.into_iter().filter(|s| s.branch_id.as_deref() == Some(branch_id)).collect()
    }

    pub async fn find_by_node_id(&self, node_id: &str) -> Vec<Snapshot<S>> {
        self.store.all().await.into_iter().filter(|s| s.node_id == node_id).collect()
    }

    pub async fn find_errors(&self) -> Vec<Snapshot<S>> {
        self.store.all().await.into_iter().filter(|s| s.error.is_some()).collect()
    }

    pub async fn find_by_time_range(&self, from: SystemTime, to: SystemTime) -> Vec<Snapshot<S>> {
        self.store.all().await.into_iter().filter(|s| s.timestamp >= from && s.timestamp <= to).collect()
    }

    pub async fn history(&self) -> Vec<Snapshot<S>> {
        self.store.all().await
    }
}

impl<S> TimeTravelDebugger<S>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    /// Field-level diff of snapshots `i` and `j`'s state, via canonical JSON
    /// serialization. Prefers each snapshot's output state (falling back to
    /// its input state for the `__end__` entry, which has no output).
    pub async fn compare(&self, i: usize, j: usize) -> Result<Vec<DiffEntry>, DebuggerError> {
        let a = self.store.load(i).await.ok_or(DebuggerError::IndexOutOfRange(i))?;
        let b = self.store.load(j).await.ok_or(DebuggerError::IndexOutOfRange(j))?;
        let a_value = serde_json::to_value(a.output.unwrap_or(a.state)).map_err(|e| DebuggerError::Serialization(e.to_string()))?;
        let b_value = serde_json::to_value(b.output.unwrap_or(b.state)).map_err(|e| DebuggerError::Serialization(e.to_string()))?;
        Ok(diff_values("", &a_value, &b_value))
    }

    pub async fn export(&self) -> Result<String, DebuggerError> {
        let exportable: Vec<ExportedSnapshot<S>> = self.store.all().await.into_iter().map(ExportedSnapshot::from).collect();
        serde_json::to_string(&exportable).map_err(|e| DebuggerError::Serialization(e.to_string()))
    }

    pub async fn import(&self, json: &str) -> Result<(), DebuggerError> {
        let exported: Vec<ExportedSnapshot<S>> = serde_json::from_str(json).map_err(|e| DebuggerError::Serialization(e.to_string()))?;
        let snapshots: Vec<Snapshot<S>> = exported.into_iter().map(Into::into).collect();
        self.store.replace_all(snapshots).await;
        Ok(())
    }
}

/// `Snapshot<S>` has a `SystemTime`/`Duration` shape that doesn't
/// round-trip through serde by default on every platform in the same
/// representation it started in; this mirrors it field-for-field with
/// `serde`-friendly types for `Export`/`Import` only.
#[derive(serde::Serialize, serde::Deserialize)]
struct ExportedSnapshot<S> {
    index: usize,
    timestamp_unix_ms: u128,
    node_id: String,
    node_name: String,
    state: S,
    output: Option<S>,
    error: Option<String>,
    duration_ms: u128,
    parent_index: Option<usize>,
    branch_id: Option<String>,
}

impl<S> From<Snapshot<S>> for ExportedSnapshot<S> {
    fn from(s: Snapshot<S>) -> Self {
        Self {
            index: s.index,
            timestamp_unix_ms: s.timestamp.duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis(),
            node_id: s.node_id,
            node_name: s.node_name,
            state: s.state,
            output: s.output,
            error: s.error,
            duration_ms: s.duration.as_millis(),
            parent_index: s.parent_index,
            branch_id: s.branch_id,
        }
    }
}

impl<S> From<ExportedSnapshot<S>> for Snapshot<S> {
    fn from(s: ExportedSnapshot<S>) -> Self {
        Self {
            index: s.index,
            timestamp: std::time::UNIX_EPOCH + std::time::Duration::from_millis(s.timestamp_unix_ms as u64),
            node_id: s.node_id,
            node_name: s.node_name,
            state: s.state,
            output: s.output,
            error: s.error,
            duration: std::time::Duration::from_millis(s.duration_ms as u64),
            parent_index: s.parent_index,
            branch_id: s.branch_id,
        }
    }
}

impl<S> Snapshot<S> {
    fn tap_parent(mut self, parent_index: usize) -> Self {
        self.parent_index = Some(parent_index);
        self
    }
}

fn diff_values(prefix: &str, a: &serde_json::Value, b: &serde_json::Value) -> Vec<DiffEntry> {
    use serde_json::Value;
    let mut out = Vec::new();
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            for (k, va) in ma {
                let field = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                match mb.get(k) {
                    Some(vb) => out.extend(diff_values(&field, va, vb)),
                    None => out.push(DiffEntry::Removed { field, value: va.clone() }),
                }
            }
            for (k, vb) in mb {
                if !ma.contains_key(k) {
                    let field = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                    out.push(DiffEntry::Added { field, value: vb.clone() });
                }
            }
        }
        _ if a != b => out.push(DiffEntry::Changed {
            field: prefix.to_string(),
            before: a.clone(),
            after: b.clone(),
        }),
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::store::InMemorySnapshotStore;
    use crate::graph::{node_fn, GraphBuilder, START, END};

    #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
    struct Counter {
        value: i32,
    }

    fn graph() -> crate::graph::CompiledGraph<Counter> {
        let mut b = GraphBuilder::<Counter>::new("g");
        b.add_node("a", node_fn("a", |mut s: Counter| async move { s.value += 1; Ok(s) })).unwrap();
        b.add_node("b", node_fn("b", |mut s: Counter| async move { s.value += 10; Ok(s) })).unwrap();
        b.add_edge(START, "a");
        b.add_edge("a", "b");
        b.add_edge("b", END);
        b.build().unwrap()
    }

    #[tokio::test]
    async fn run_emits_start_each_node_and_end_snapshots() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        let result = debugger.run(Counter::default()).await.unwrap();
        assert_eq!(result.value, 11);

        let history = debugger.history().await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].node_id, "__start__");
        assert_eq!(history[1].node_id, "a");
        assert_eq!(history[2].node_id, "b");
        assert_eq!(history[3].node_id, "__end__");
    }

    #[tokio::test]
    async fn go_back_and_forward_move_the_cursor() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        debugger.run(Counter::default()).await.unwrap();
        assert_eq!(debugger.current_index().await, 3);
        debugger.go_back().await.unwrap();
        assert_eq!(debugger.current_index().await, 2);
        debugger.go_to(0).await.unwrap();
        let err = debugger.go_back().await.unwrap_err();
        assert!(matches!(err, DebuggerError::IndexOutOfRange(0)));
        debugger.go_forward().await.unwrap();
        assert_eq!(debugger.current_index().await, 1);
    }

    #[tokio::test]
    async fn replay_from_produces_a_fresh_branch() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        debugger.run(Counter::default()).await.unwrap();
        let result = debugger.replay_from(1).await.unwrap();
        assert_eq!(result.value, 11);
        let branches = debugger.get_branches().await;
        assert_eq!(branches.len(), 1);
        let branch_history = debugger.get_branch_history(&branches[0]).await;
        assert_eq!(branch_history.len(), 1);
        assert_eq!(branch_history[0].node_id, "b");
    }

    #[tokio::test]
    async fn compare_reports_changed_field() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        debugger.run(Counter::default()).await.unwrap();
        let diff = debugger.compare(1, 2).await.unwrap();
        assert!(diff.iter().any(|d| matches!(d, DiffEntry::Changed { field, .. } if field == "value")));
    }

    #[tokio::test]
    async fn export_then_import_restores_history() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        debugger.run(Counter::default()).await.unwrap();
        let exported = debugger.export().await.unwrap();

        let restored = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        restored.import(&exported).await.unwrap();
        assert_eq!(restored.history().await.len(), debugger.history().await.len());
        assert_eq!(restored.history().await[1].node_id, debugger.history().await[1].node_id);
    }

    #[tokio::test]
    async fn find_errors_and_find_by_node_id_filter_history() {
        let debugger = TimeTravelDebugger::new(Arc::new(graph()), Arc::new(InMemorySnapshotStore::new(100)));
        debugger.run(Counter::default()).await.unwrap();
        assert!(debugger.find_errors().await.is_empty());
        assert_eq!(debugger.find_by_node_id("a").await.len(), 1);
    }
}
