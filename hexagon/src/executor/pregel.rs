//! Pregel-style superstep executor: cycles, bounded iteration, parallel
//! fan-out within a step, pluggable trigger mode and state merger.
//!
//! Grounded in `other_examples`' `SuperStepExecutor` (active-node scheduling,
//! parallel execution with per-step state merge, checkpoint-per-superstep,
//! max-steps guard), adapted to this crate's `Node`/`CompiledGraph` types and
//! extended with the two trigger modes.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use crate::checkpoint::RunnableConfig;
use crate::execution::{ExecutionError, InterruptSignal};
use crate::executor::merger::{LastWriteWins, Merger};
use crate::graph::{resolve_conditional, AddressSegment, CompiledGraph, NodeOutcome, RunContext, END};
use crate::telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// A successor becomes active the moment any predecessor completes in
    /// the current step.
    AnyPredecessor,
    /// A per-successor counter increments per completing predecessor;
    /// activation occurs exactly when the counter equals in-degree, then
    /// resets for the next round.
    AllPredecessors,
}

pub type TerminationPredicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct PregelConfig<S> {
    pub max_supersteps: u64,
    pub default_trigger_mode: TriggerMode,
    pub parallel_within_step: bool,
    pub termination_predicate: Option<TerminationPredicate<S>>,
    pub debug: bool,
}

impl<S> Default for PregelConfig<S> {
    fn default() -> Self {
        Self {
            max_supersteps: 100,
            default_trigger_mode: TriggerMode::AnyPredecessor,
            parallel_within_step: true,
            termination_predicate: None,
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PregelOutcome<S> {
    Completed { state: S, steps_run: u64 },
    Interrupted { state: S, signal: InterruptSignal },
}

impl<S> PregelOutcome<S> {
    pub fn into_state(self) -> S {
        match self {
            PregelOutcome::Completed { state, .. } => state,
            PregelOutcome::Interrupted { state, .. } => state,
        }
    }
}

pub struct PregelExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    graph: CompiledGraph<S>,
    config: PregelConfig<S>,
    merger: Arc<dyn Merger<S>>,
}

impl<S> PregelExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// The merger has no default: per the open design question on Pregel
    /// merging, a multi-writer graph must get a merger chosen deliberately.
    pub fn new(graph: CompiledGraph<S>, config: PregelConfig<S>, merger: Arc<dyn Merger<S>>) -> Self {
        Self { graph, config, merger }
    }

    /// Convenience constructor for callers who accept `LastWriteWins`'s
    /// documented weakness explicitly, rather than stumbling into it.
    pub fn with_last_write_wins(graph: CompiledGraph<S>, config: PregelConfig<S>) -> Self {
        Self::new(graph, config, Arc::new(LastWriteWins))
    }

    fn next_targets(&self, from: &str, state: &S) -> Result<Vec<String>, ExecutionError> {
        if let Some(groups) = self.graph.conditional_edges_for(from) {
            if let Some(target) = resolve_conditional(groups, state) {
                if target != END && self.graph.node(&target).is_none() {
                    return Err(ExecutionError::UnknownRoutingTarget {
                        node: from.to_string(),
                        target,
                    });
                }
                return Ok(vec![target]);
            }
        }
        Ok(self.graph.plain_successors(from).to_vec())
    }

    pub async fn invoke(&self, state0: S, config: RunnableConfig) -> Result<PregelOutcome<S>, ExecutionError> {
        self.graph.record_run_started().await;
        telemetry::graph_start(self.graph.name());
        let run_start = Instant::now();

        let ctx = RunContext::new(config.clone());
        let mut state = state0;
        let mut active: HashSet<String> = HashSet::from([self.graph.entry_point().to_string()]);
        let mut pred_counts: HashMap<String, u64> = HashMap::new();
        let mut step: u64 = 0;

        loop {
            let non_sentinel_active: Vec<String> = active.iter().filter(|n| n.as_str() != END).cloned().collect();
            if non_sentinel_active.is_empty() {
                break;
            }
            if let Some(pred) = &self.config.termination_predicate {
                if pred(&state) {
                    break;
                }
            }
            if step >= self.config.max_supersteps {
                telemetry::graph_error(self.graph.name(), "max supersteps exceeded");
                return Err(ExecutionError::MaxSuperstepsExceeded(self.config.max_supersteps));
            }

            let mut ordered = non_sentinel_active.clone();
            ordered.sort();
            telemetry::superstep_start(step, &ordered);
            let step_start = Instant::now();

            let snapshot = state.clone();
            let run_one = |name: &String| {
                let node = self
                    .graph
                    .node(name)
                    .cloned()
                    .ok_or_else(|| ExecutionError::UnknownNode(name.clone()));
                let snapshot = snapshot.clone();
                let node_ctx = ctx.with_segment(AddressSegment::node(name));
                let name = name.clone();
                async move {
                    let node = node?;
                    let t0 = Instant::now();
                    telemetry::node_start(&name);
                    let result = node.run(snapshot, &node_ctx).await;
                    if let Ok(_) = &result {
                        telemetry::node_complete(&name, t0.elapsed());
                    }
                    result.map(|outcome| (name, outcome))
                }
            };

            // Both branches invoke every active node against the same
            // base-state snapshot per §4.3; the toggle only controls whether
            // the step's handlers run concurrently or one at a time.
            let results = if self.config.parallel_within_step {
                futures::future::join_all(ordered.iter().map(run_one)).await
            } else {
                let mut results = Vec::with_capacity(ordered.len());
                for name in &ordered {
                    results.push(run_one(name).await);
                }
                results
            };

            let mut outputs: Vec<(String, S)> = Vec::new();
            for result in results {
                match result {
                    Ok((name, NodeOutcome::Next(s))) => {
                        self.graph.record_stats(&name, step_start.elapsed()).await;
                        outputs.push((name, s));
                    }
                    Ok((name, NodeOutcome::Interrupt { state: s, signal })) => {
                        self.graph.record_stats(&name, step_start.elapsed()).await;
                        return Ok(PregelOutcome::Interrupted { state: s, signal });
                    }
                    Err(err) => {
                        telemetry::graph_error(self.graph.name(), &err.to_string());
                        return Err(err);
                    }
                }
            }

            state = self.merger.merge(outputs.clone());
            telemetry::superstep_complete(step, step_start.elapsed());

            active.clear();
            match self.config.default_trigger_mode {
                TriggerMode::AnyPredecessor => {
                    for (name, _) in &outputs {
                        for succ in self.next_targets(name, &state)? {
                            active.insert(succ);
                        }
                    }
                }
                TriggerMode::AllPredecessors => {
                    for (name, _) in &outputs {
                        for succ in self.next_targets(name, &state)? {
                            let in_degree = self.graph.plan().dependencies.get(&succ).map(|s| s.len() as u64).unwrap_or(1).max(1);
                            let count = pred_counts.entry(succ.clone()).or_insert(0);
                            *count += 1;
                            if *count >= in_degree {
                                active.insert(succ.clone());
                                pred_counts.insert(succ, 0);
                            }
                        }
                    }
                }
            }

            step += 1;
        }

        telemetry::graph_complete(self.graph.name(), run_start.elapsed());
        Ok(PregelOutcome::Completed { state, steps_run: step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_fn, GraphBuilder, START};

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: i32,
    }

    /// Scenario: Pregel cycle with AnyPredecessor, scenario 3.
    #[tokio::test]
    async fn pregel_cycle_terminates_at_counter_three() {
        let mut b = GraphBuilder::<Counter>::new("cycle");
        b.add_node(
            "think",
            node_fn("think", |mut s: Counter| async move {
                s.value += 1;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_node("decide", node_fn("decide", |s: Counter| async move { Ok(s) })).unwrap();
        b.add_edge(START, "think");
        b.add_edge("think", "decide");
        let mut labels = HashMap::new();
        labels.insert("done".to_string(), END.to_string());
        labels.insert("think".to_string(), "think".to_string());
        b.add_conditional_edge(
            "decide",
            Arc::new(|s: &Counter| if s.value >= 3 { "done".to_string() } else { "think".to_string() }),
            Some(labels),
        );
        let graph = b.build().unwrap();

        let config = PregelConfig { max_supersteps: 10, ..Default::default() };
        let executor = PregelExecutor::with_last_write_wins(graph, config);
        let outcome = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 3);
    }

    #[tokio::test]
    async fn max_supersteps_exceeded_is_fatal() {
        let mut b = GraphBuilder::<Counter>::new("spin");
        b.add_node("loop", node_fn("loop", |s: Counter| async move { Ok(s) })).unwrap();
        b.add_edge(START, "loop");
        b.add_edge("loop", "loop");
        let graph = b.build().unwrap();

        let config = PregelConfig { max_supersteps: 3, ..Default::default() };
        let executor = PregelExecutor::with_last_write_wins(graph, config);
        let err = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::MaxSuperstepsExceeded(3)));
    }

    #[tokio::test]
    async fn fan_out_runs_siblings_and_all_predecessors_waits_for_both() {
        let mut b = GraphBuilder::<Counter>::new("fanin");
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
        b.add_node("join", node_fn("join", |mut s: Counter| async move {
            s.value += 100;
            Ok(s)
        }))
        .unwrap();
        b.add_edge(START, "a");
        b.add_edge(START, "b");
        b.add_edge("a", "join");
        b.add_edge("b", "join");
        let graph = b.build().unwrap();

        let config = PregelConfig {
            default_trigger_mode: TriggerMode::AllPredecessors,
            max_supersteps: 10,
            ..Default::default()
        };
        let executor = PregelExecutor::with_last_write_wins(graph, config);
        let outcome = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap();
        // "join" only activates once both "a" and "b" have completed; its
        // contribution (+100) must land on top of whichever sibling the
        // merger kept.
        assert!(outcome.into_state().value >= 101);
    }

    #[tokio::test]
    async fn parallel_within_step_disabled_still_runs_every_active_node() {
        let mut b = GraphBuilder::<Counter>::new("fanin-sequential");
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
        b.add_edge(START, "b");
        b.add_edge("a", END);
        b.add_edge("b", END);
        let graph = b.build().unwrap();

        let config = PregelConfig { parallel_within_step: false, max_supersteps: 10, ..Default::default() };
        let executor = PregelExecutor::with_last_write_wins(graph, config);
        let outcome = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap();
        // Both "a" and "b" ran against the same base snapshot (value 0) even
        // though they were invoked one at a time; the merger picks whichever
        // ran last in sorted order ("b").
        assert_eq!(outcome.into_state().value, 10);
    }
}
