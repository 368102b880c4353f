//! Single-frontier DAG executor: strictly sequential, conditional routing,
//! streaming, checkpoint-on-end.
//!
//! Current-node cursor driven against the compiled graph's conditional
//! edges, checkpoint saved once after the loop when a checkpointer and
//! thread id are present.

use std::fmt::Debug;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::checkpoint::{Checkpoint, RunnableConfig};
use crate::execution::{ExecutionError, InterruptSignal};
use crate::graph::{resolve_conditional, AddressSegment, CompiledGraph, NodeOutcome, RunContext, END, START};
use crate::stream::{StreamEvent, StreamMode};
use crate::telemetry;

/// The outcome of a DAG run: either it ran to completion, or a node asked to
/// pause (HITL). Kept as a distinct return type rather than folding
/// `Interrupted` into `ExecutionError`, since an interrupt isn't a failure —
/// it carries a valid, resumable state.
#[derive(Debug, Clone)]
pub enum DagOutcome<S> {
    Completed(S),
    Interrupted { state: S, signal: InterruptSignal },
}

impl<S> DagOutcome<S> {
    pub fn state(&self) -> &S {
        match self {
            DagOutcome::Completed(s) => s,
            DagOutcome::Interrupted { state, .. } => state,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            DagOutcome::Completed(s) => s,
            DagOutcome::Interrupted { state, .. } => state,
        }
    }
}

pub struct DagExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    graph: CompiledGraph<S>,
}

impl<S> DagExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(graph: CompiledGraph<S>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &CompiledGraph<S> {
        &self.graph
    }

    /// Looks up the next node after `current`: the first resolving
    /// conditional group wins, falling back to the first plain successor.
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

    async fn maybe_checkpoint(&self, config: &RunnableConfig, current_node: &str, state: &S) {
        let (Some(checkpointer), Some(thread_id)) = (self.graph.checkpointer(), config.thread_id.as_ref()) else {
            return;
        };
        let checkpoint = Checkpoint::new(thread_id.clone(), self.graph.name().to_string(), current_node.to_string(), state.clone());
        match checkpointer.save(checkpoint).await {
            Ok(saved) => telemetry::checkpoint_saved(thread_id, &saved.id),
            Err(err) => tracing::warn!(thread_id, error = %err, "checkpoint save failed"),
        }
    }

    pub async fn invoke(&self, state0: S, config: RunnableConfig) -> Result<DagOutcome<S>, ExecutionError> {
        self.run(self.graph.entry_point().to_string(), state0, config, None).await
    }

    /// Runs starting at an arbitrary node rather than the graph's entry
    /// point. Used to resume a run that previously paused at `start_node`
    /// (HITL resume, checkpoint replay) once the caller has the state to
    /// hand back in.
    pub async fn invoke_from(&self, start_node: impl Into<String>, state0: S, config: RunnableConfig) -> Result<DagOutcome<S>, ExecutionError> {
        self.run(start_node.into(), state0, config, None).await
    }

    pub fn stream(&self, state0: S, config: RunnableConfig, stream_mode: std::collections::HashSet<StreamMode>) -> ReceiverStream<StreamEvent<S>>
    where
        S: 'static,
    {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.graph.clone();
        let entry = self.graph.entry_point().to_string();
        tokio::spawn(async move {
            let executor = DagExecutor { graph };
            let _ = executor.run(entry, state0, config, Some((tx, stream_mode))).await;
        });
        ReceiverStream::new(rx)
    }

    async fn run(
        &self,
        start_node: String,
        state0: S,
        config: RunnableConfig,
        stream: Option<(mpsc::Sender<StreamEvent<S>>, std::collections::HashSet<StreamMode>)>,
    ) -> Result<DagOutcome<S>, ExecutionError> {
        let (stream_tx, stream_mode) = match stream {
            Some((tx, modes)) => (Some(tx), modes),
            None => (None, Default::default()),
        };
        let mut ctx = RunContext::new(config.clone());
        ctx.stream_tx = stream_tx.clone();
        ctx.stream_mode = stream_mode;

        self.graph.record_run_started().await;
        telemetry::graph_start(self.graph.name());
        let run_start = Instant::now();

        let mut current = start_node;
        let mut state = state0;

        loop {
            if current == END {
                break;
            }
            if ctx.is_cancelled() {
                telemetry::graph_error(self.graph.name(), "cancelled");
                return Err(ExecutionError::Cancelled(current));
            }

            let node = self
                .graph
                .node(&current)
                .ok_or_else(|| ExecutionError::UnknownNode(current.clone()))?
                .clone();

            let node_ctx = ctx.with_segment(AddressSegment::node(&current));
            telemetry::node_start(&current);
            let node_start = Instant::now();

            if let Some(tx) = &stream_tx {
                let _ = tx.send(StreamEvent::NodeStart(current.clone())).await;
            }

            let outcome = node.run(state, &node_ctx).await;
            let outcome = match outcome {
                Ok(o) => o,
                Err(err) => {
                    telemetry::node_error(&current, &err.to_string());
                    if let Some(tx) = &stream_tx {
                        let _ = tx.send(StreamEvent::Error(err.to_string())).await;
                    }
                    telemetry::graph_error(self.graph.name(), &err.to_string());
                    return Err(err);
                }
            };
            telemetry::node_complete(&current, node_start.elapsed());
            self.graph.record_stats(&current, node_start.elapsed()).await;

            match outcome {
                NodeOutcome::Interrupt { state: new_state, signal } => {
                    self.maybe_checkpoint(&config, &current, &new_state).await;
                    if let Some(tx) = &stream_tx {
                        let _ = tx.send(StreamEvent::NodeEnd { node: current.clone(), state: new_state.clone() }).await;
                    }
                    return Ok(DagOutcome::Interrupted { state: new_state, signal });
                }
                NodeOutcome::Next(new_state) => {
                    if let Some(tx) = &stream_tx {
                        let _ = tx.send(StreamEvent::NodeEnd { node: current.clone(), state: new_state.clone() }).await;
                    }
                    let next = self.get_next(&current, &new_state)?;
                    state = new_state;
                    current = next;
                }
            }
        }

        self.maybe_checkpoint(&config, END, &state).await;
        telemetry::graph_complete(self.graph.name(), run_start.elapsed());
        if let Some(tx) = &stream_tx {
            let _ = tx.send(StreamEvent::End(state.clone())).await;
        }
        Ok(DagOutcome::Completed(state))
    }
}

impl<S> Clone for DagExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn clone(&self) -> Self {
        Self { graph: self.graph.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_fn, GraphBuilder};

    #[derive(Debug, Clone, Default)]
    struct CounterState {
        counter: i32,
        path: String,
    }

    fn linear_graph() -> CompiledGraph<CounterState> {
        let mut b = GraphBuilder::<CounterState>::new("linear");
        b.add_node(
            "a",
            node_fn("a", |mut s: CounterState| async move {
                s.counter = 1;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_node(
            "b",
            node_fn("b", |mut s: CounterState| async move {
                s.counter += 1;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_node(
            "c",
            node_fn("c", |mut s: CounterState| async move {
                s.path.push_str("abc");
                Ok(s)
            }),
        )
        .unwrap();
        b.add_edge(START, "a");
        b.add_edge("a", "b");
        b.add_edge("b", "c");
        b.add_edge("c", END);
        b.build().unwrap()
    }

    /// Scenario: linear three-step DAG, scenario 1.
    #[tokio::test]
    async fn linear_three_step_dag_produces_expected_state() {
        let graph = linear_graph();
        let executor = DagExecutor::new(graph);
        let outcome = executor
            .invoke(CounterState::default(), RunnableConfig::default())
            .await
            .unwrap();
        let state = outcome.into_state();
        assert_eq!(state.counter, 2);
        assert_eq!(state.path, "abc");
    }

    /// Scenario: conditional routing, scenario 2.
    #[tokio::test]
    async fn conditional_routing_picks_high_path_above_threshold() {
        let mut b = GraphBuilder::<CounterState>::new("cond");
        b.add_node("check", node_fn("check", |s: CounterState| async move { Ok(s) })).unwrap();
        b.add_node(
            "high",
            node_fn("high", |mut s: CounterState| async move {
                s.path.push('H');
                Ok(s)
            }),
        )
        .unwrap();
        b.add_node(
            "low",
            node_fn("low", |mut s: CounterState| async move {
                s.path.push('L');
                Ok(s)
            }),
        )
        .unwrap();
        b.add_edge(START, "check");
        let mut labels = std::collections::HashMap::new();
        labels.insert("high".to_string(), "high".to_string());
        labels.insert("low".to_string(), "low".to_string());
        b.add_conditional_edge(
            "check",
            std::sync::Arc::new(|s: &CounterState| if s.counter > 5 { "high".to_string() } else { "low".to_string() }),
            Some(labels),
        );
        b.add_edge("high", END);
        b.add_edge("low", END);
        let graph = b.build().unwrap();

        let executor = DagExecutor::new(graph);
        let outcome = executor
            .invoke(CounterState { counter: 10, path: String::new() }, RunnableConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.into_state().path, "H");
    }

    #[tokio::test]
    async fn missing_outgoing_edge_is_fatal() {
        let mut b = GraphBuilder::<CounterState>::new("dangling");
        b.add_node("a", node_fn("a", |s: CounterState| async move { Ok(s) })).unwrap();
        b.add_edge(START, "a");
        let graph = b.build().unwrap();
        let executor = DagExecutor::new(graph);
        let err = executor
            .invoke(CounterState::default(), RunnableConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NoOutgoingEdge(n) if n == "a"));
    }
}
