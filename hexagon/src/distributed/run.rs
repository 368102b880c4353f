//! `run_distributed`: the orchestration described in spec §4.8 steps 1-4.
//!
//! Builds a node-override map from the graph's recorded placements, runs
//! through the standard `DagExecutor`, and — because `with_node_overrides`
//! returns a new `CompiledGraph` rather than mutating the original in
//! place — the caller's graph is never touched, so "restore the original
//! handlers" (step 4) holds by construction instead of needing a cleanup
//! path that could be skipped on a panic.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::checkpoint::RunnableConfig;
use crate::distributed::error::DistributedError;
use crate::distributed::proxy::RemoteProxyNode;
use crate::distributed::registry::ExecutorRegistry;
use crate::executor::{DagExecutor, DagOutcome};
use crate::graph::CompiledGraph;

#[derive(Debug, Clone, Default)]
pub struct DistributedRunOptions {
    pub config: RunnableConfig,
}

pub async fn run_distributed<S>(
    graph: &CompiledGraph<S>,
    state0: S,
    registry: &ExecutorRegistry,
    options: DistributedRunOptions,
) -> Result<DagOutcome<S>, DistributedError>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    let mut overrides: HashMap<String, Arc<dyn crate::graph::Node<S>>> = HashMap::new();

    for (node_name, placement) in graph.node_placements() {
        let Some(original) = graph.node(node_name) else { continue };
        let executor = match registry.get(&placement.executor_name) {
            Some(executor) => executor,
            None if placement.fallback_allowed => continue,
            None => return Err(DistributedError::UnknownExecutor(placement.executor_name.clone())),
        };
        overrides.insert(
            node_name.clone(),
            Arc::new(RemoteProxyNode::new(original.clone(), executor, placement.fallback_allowed)) as Arc<dyn crate::graph::Node<S>>,
        );
    }

    let distributed_graph = graph.with_node_overrides(overrides);
    let executor = DagExecutor::new(distributed_graph);
    executor.invoke(state0, options.config).await.map_err(DistributedError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_fn, GraphBuilder, END, START};
    use async_trait::async_trait;

    #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
    struct Counter {
        value: i32,
    }

    struct DoubleExecutor;

    #[async_trait]
    impl crate::distributed::executor::RemoteNodeExecutor for DoubleExecutor {
        async fn execute(&self, _node_name: &str, state: Vec<u8>) -> Result<Vec<u8>, DistributedError> {
            let mut counter: Counter = serde_json::from_slice(&state).unwrap();
            counter.value *= 2;
            Ok(serde_json::to_vec(&counter).unwrap())
        }

        async fn ping(&self) -> Result<(), DistributedError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "doubler"
        }
    }

    struct AlwaysFailsExecutor;

    #[async_trait]
    impl crate::distributed::executor::RemoteNodeExecutor for AlwaysFailsExecutor {
        async fn execute(&self, node_name: &str, _state: Vec<u8>) -> Result<Vec<u8>, DistributedError> {
            Err(DistributedError::RemoteExecutionFailed {
                node: node_name.to_string(),
                executor: "flaky".to_string(),
                source: "connection refused".to_string(),
            })
        }

        async fn ping(&self) -> Result<(), DistributedError> {
            Err(DistributedError::UnknownExecutor("flaky".to_string()))
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn build_graph(placement: crate::graph::NodePlacement) -> CompiledGraph<Counter> {
        let mut b = GraphBuilder::<Counter>::new("g");
        b.add_node(
            "inc",
            node_fn("inc", |mut s: Counter| async move {
                s.value += 1;
                Ok(s)
            }),
        )
        .unwrap();
        b.add_edge(START, "inc");
        b.add_edge("inc", END);
        b.with_node_placement(placement).build().unwrap()
    }

    #[tokio::test]
    async fn remote_node_executes_via_registered_executor() {
        let graph = build_graph(crate::graph::NodePlacement::new("inc", "doubler"));
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(DoubleExecutor));

        let outcome = run_distributed(&graph, Counter { value: 5 }, &registry, DistributedRunOptions::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 10);
    }

    #[tokio::test]
    async fn falls_back_to_original_handler_when_remote_fails_and_fallback_allowed() {
        let graph = build_graph(crate::graph::NodePlacement::new("inc", "flaky"));
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(AlwaysFailsExecutor));

        let outcome = run_distributed(&graph, Counter { value: 5 }, &registry, DistributedRunOptions::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 6);
    }

    #[tokio::test]
    async fn unknown_executor_name_is_an_error_when_fallback_is_disallowed() {
        let graph = build_graph(crate::graph::NodePlacement::new("inc", "nonexistent").no_fallback());
        let registry = ExecutorRegistry::new();
        let err = run_distributed(&graph, Counter::default(), &registry, DistributedRunOptions::default()).await.unwrap_err();
        assert!(matches!(err, DistributedError::UnknownExecutor(name) if name == "nonexistent"));
    }

    #[tokio::test]
    async fn missing_executor_with_fallback_allowed_runs_locally() {
        let graph = build_graph(crate::graph::NodePlacement::new("inc", "nonexistent"));
        let registry = ExecutorRegistry::new();
        let outcome = run_distributed(&graph, Counter { value: 5 }, &registry, DistributedRunOptions::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 6);
    }

    #[tokio::test]
    async fn original_graph_is_untouched_after_a_distributed_run() {
        let graph = build_graph(crate::graph::NodePlacement::new("inc", "doubler"));
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(DoubleExecutor));
        run_distributed(&graph, Counter { value: 1 }, &registry, DistributedRunOptions::default()).await.unwrap();

        let local = DagExecutor::new(graph.clone());
        let outcome = local.invoke(Counter { value: 1 }, RunnableConfig::default()).await.unwrap();
        assert_eq!(outcome.into_state().value, 2);
    }
}
