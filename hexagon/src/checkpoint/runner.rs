//! `CheckpointRunner`: drives a compiled graph over an enhanced saver,
//! auto-saving at a configurable step interval, on error, and on interrupt.
//!
//! Distinct from [`crate::executor::DagExecutor`] (which checkpoints only at
//! the very end) because resuming, forking, and per-step retry all need a
//! saver in the loop rather than bolted on afterward.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::checkpoint::config::RunnableConfig;
use crate::checkpoint::enhanced::EnhancedCheckpointer;
use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::model::{Checkpoint, CheckpointStatus, EnhancedCheckpoint};
use crate::execution::ExecutionError;
use crate::executor::DagOutcome;
use crate::graph::{resolve_conditional, AddressSegment, CompiledGraph, NodeOutcome, RunContext, END};
use crate::telemetry;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Clone)]
pub struct RunnerConfig {
    /// Auto-save after every Nth completed node. 1 means every step.
    pub auto_save_every_n_steps: u64,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            auto_save_every_n_steps: 1,
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
        }
    }
}

type ErrorCallback = Arc<dyn Fn(&CheckpointError) + Send + Sync>;

pub struct CheckpointRunner<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    graph: CompiledGraph<S>,
    saver: Arc<dyn EnhancedCheckpointer<S>>,
    config: RunnerConfig,
    error_callback: Option<ErrorCallback>,
}

impl<S> CheckpointRunner<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(graph: CompiledGraph<S>, saver: Arc<dyn EnhancedCheckpointer<S>>, config: RunnerConfig) -> Self {
        Self {
            graph,
            saver,
            config,
            error_callback: None,
        }
    }

    /// Saver errors during auto-save never abort the run (best-effort
    /// persistence); this callback is the only way to observe them.
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.error_callback = Some(callback);
        self
    }

    pub async fn run(&self, thread_id: impl Into<String>, state0: S) -> Result<DagOutcome<S>, RunnerError> {
        let entry = self.graph.entry_point().to_string();
        self.run_from(thread_id.into(), entry, state0, None).await
    }

    pub async fn resume(&self, checkpoint_id: &str) -> Result<DagOutcome<S>, RunnerError> {
        let cp = self.saver.load_enhanced_by_id(checkpoint_id).await?;
        self.run_from(
            cp.base.thread_id.clone(),
            cp.base.current_node.clone(),
            cp.base.state.clone(),
            Some(cp.base.id.clone()),
        )
        .await
    }

    pub async fn resume_from_latest(&self, thread_id: &str) -> Result<DagOutcome<S>, RunnerError> {
        let cp = self.saver.load_enhanced(thread_id).await?;
        self.run_from(
            thread_id.to_string(),
            cp.base.current_node.clone(),
            cp.base.state.clone(),
            Some(cp.base.id.clone()),
        )
        .await
    }

    /// Creates a branch from `checkpoint_id`, applies `modifier` to the
    /// loaded state, and resumes on the new branch.
    pub async fn fork<F>(&self, checkpoint_id: &str, branch_name: &str, modifier: F) -> Result<DagOutcome<S>, RunnerError>
    where
        F: FnOnce(S) -> S,
    {
        let base = self.saver.load_enhanced_by_id(checkpoint_id).await?;
        let branch = self.saver.create_branch(checkpoint_id, branch_name).await?;
        let mutated = modifier(base.base.state.clone());
        self.run_from(
            base.base.thread_id.clone(),
            base.base.current_node.clone(),
            mutated,
            Some(branch.latest_checkpoint_id.clone()),
        )
        .await
    }

    pub async fn get_history(&self, checkpoint_id: &str, limit: usize) -> Result<Vec<EnhancedCheckpoint<S>>, RunnerError> {
        Ok(self.saver.get_history(checkpoint_id, limit).await?)
    }

    fn get_next(&self, current: &str, state: &S) -> Result<String, ExecutionError> {
        if let Some(groups) = self.graph.conditional_edges_for(current) {
            if let Some(target) = resolve_conditional(groups, state) {
                if target != END && self.graph.node(&target).is_none() {
                    return Err(ExecutionError::UnknownRoutingTarget {
                        node: current.to_string(),
                        target,
                    });
                }
                return Ok(target);
            }
        }
        self.graph
            .first_plain_successor(current)
            .map(|s| s.to_string())
            .ok_or_else(|| ExecutionError::NoOutgoingEdge(current.to_string()))
    }

    async fn save_checkpoint(
        &self,
        thread_id: &str,
        current_node: &str,
        completed_nodes: &[String],
        state: &S,
        parent_id: Option<String>,
        status: CheckpointStatus,
    ) -> Option<String> {
        let mut base = Checkpoint::new(thread_id.to_string(), self.graph.name().to_string(), current_node.to_string(), state.clone());
        base.parent_id = parent_id.clone();
        base.completed_nodes = completed_nodes.to_vec();
        let mut enhanced = EnhancedCheckpoint::from_base(base, String::new());
        enhanced.status = status;

        match self.saver.save_enhanced(enhanced).await {
            Ok(saved) => {
                telemetry::checkpoint_saved(thread_id, &saved.base.id);
                Some(saved.base.id)
            }
            Err(err) => {
                if let Some(cb) = &self.error_callback {
                    cb(&err);
                }
                parent_id
            }
        }
    }

    async fn run_from(
        &self,
        thread_id: String,
        start_node: String,
        state0: S,
        parent_id: Option<String>,
    ) -> Result<DagOutcome<S>, RunnerError> {
        let config = RunnableConfig {
            thread_id: Some(thread_id.clone()),
            ..Default::default()
        };
        let ctx = RunContext::new(config);

        let mut current = start_node;
        let mut state = state0;
        let mut parent = parent_id;
        let mut completed: Vec<String> = Vec::new();
        let mut step: u64 = 0;

        loop {
            if current == END {
                break;
            }

            let node = self
                .graph
                .node(&current)
                .cloned()
                .ok_or_else(|| ExecutionError::UnknownNode(current.clone()))?;
            let node_ctx = ctx.with_segment(AddressSegment::node(&current));

            let mut attempt = 0u32;
            let outcome = loop {
                match node.run(state.clone(), &node_ctx).await {
                    Ok(outcome) => break outcome,
                    Err(err) if attempt < self.config.max_retries => {
                        attempt += 1;
                        tracing::debug!(node = %current, attempt, "retrying node after failure");
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                    Err(err) => {
                        self.save_checkpoint(&thread_id, &current, &completed, &state, parent.clone(), CheckpointStatus::Failed)
                            .await;
                        return Err(RunnerError::Execution(err));
                    }
                }
            };

            match outcome {
                NodeOutcome::Interrupt { state: new_state, signal } => {
                    completed.push(current.clone());
                    self.save_checkpoint(
                        &thread_id,
                        &current,
                        &completed,
                        &new_state,
                        parent.clone(),
                        CheckpointStatus::Interrupted,
                    )
                    .await;
                    return Ok(DagOutcome::Interrupted { state: new_state, signal });
                }
                NodeOutcome::Next(new_state) => {
                    completed.push(current.clone());
                    let next = self.get_next(&current, &new_state)?;
                    state = new_state;
                    step += 1;
                    if self.config.auto_save_every_n_steps > 0 && step % self.config.auto_save_every_n_steps == 0 {
                        parent = self
                            .save_checkpoint(&thread_id, &current, &completed, &state, parent.clone(), CheckpointStatus::Running)
                            .await;
                    }
                    current = next;
                }
            }
        }

        self.save_checkpoint(&thread_id, END, &completed, &state, parent, CheckpointStatus::Completed)
            .await;
        Ok(DagOutcome::Completed(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::memory_saver::MemorySaver;
    use crate::graph::{node_fn, GraphBuilder, START};

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: i32,
    }

    fn counting_graph() -> CompiledGraph<Counter> {
        let mut b = GraphBuilder::<Counter>::new("g");
        b.add_node(
            "a",
            node_fn("a", |mut s: Counter| async move {
                s.value += 1;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_node(
            "b",
            node_fn("b", |mut s: Counter| async move {
                s.value += 10;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_edge(START, "a");
        b.add_edge("a", "b");
        b.add_edge("b", END);
        b.build().unwrap()
    }

    #[tokio::test]
    async fn run_auto_saves_every_step_and_completes() {
        let saver = Arc::new(MemorySaver::<Counter>::new());
        let runner = CheckpointRunner::new(counting_graph(), saver.clone(), RunnerConfig::default());
        let outcome = runner.run("t1", Counter::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 11);
        let history = saver.list("t1").await.unwrap();
        assert!(history.len() >= 2, "expected a checkpoint per auto-saved step");
    }

    #[tokio::test]
    async fn resume_from_latest_picks_up_after_node_a() {
        let saver = Arc::new(MemorySaver::<Counter>::new());
        let runner = CheckpointRunner::new(counting_graph(), saver.clone(), RunnerConfig::default());
        runner.run("t2", Counter::default()).await.unwrap();

        let resumed = runner.resume_from_latest("t2").await.unwrap();
        // The graph already completed, so resuming from the final checkpoint
        // (current_node == END) ends immediately with the same state.
        assert_eq!(resumed.into_state().value, 11);
    }

    #[tokio::test]
    async fn fork_mutates_state_on_a_new_branch() {
        let saver = Arc::new(MemorySaver::<Counter>::new());
        let runner = CheckpointRunner::new(counting_graph(), saver.clone(), RunnerConfig::default());
        runner.run("t3", Counter::default()).await.unwrap();

        let history = saver.list("t3").await.unwrap();
        let first_checkpoint_id = history.first().unwrap().checkpoint_id.clone();

        let forked = runner
            .fork(&first_checkpoint_id, "experiment", |mut s: Counter| {
                s.value += 1000;
                s
            })
            .await
            .unwrap();
        assert!(forked.into_state().value >= 1000);
    }

    #[tokio::test]
    async fn retries_exhaust_then_surface_the_last_error() {
        let mut b = GraphBuilder::<Counter>::new("flaky");
        b.add_node(
            "always_fails",
            node_fn("always_fails", |_s: Counter| async move {
                Err(ExecutionError::handler_failed("always_fails", "boom"))
            }),
        )
        .unwrap();
        b.add_edge(START, "always_fails");
        b.add_edge("always_fails", END);
        let graph = b.build().unwrap();

        let saver = Arc::new(MemorySaver::<Counter>::new());
        let config = RunnerConfig {
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let runner = CheckpointRunner::new(graph, saver, config);
        let err = runner.run("t4", Counter::default()).await.unwrap_err();
        assert!(matches!(err, RunnerError::Execution(ExecutionError::HandlerFailed { .. })));
    }
}
