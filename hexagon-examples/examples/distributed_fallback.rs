//! Distributed fallback: `step1` is placed on an executor named `gpu`, but
//! the registry never registers it. With fallback allowed the run falls
//! back to the local handler; with fallback disallowed the same call fails
//! naming the missing executor.

use hexagon::distributed::{run_distributed, DistributedError, DistributedRunOptions, ExecutorRegistry};
use hexagon::execution::ExecutionError;
use hexagon::graph::{node_fn, GraphBuilder, NodePlacement, END, START};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct Counter {
    value: i32,
}

fn build(fallback_allowed: bool) -> hexagon::graph::CompiledGraph<Counter> {
    let mut builder = GraphBuilder::<Counter>::new("distributed");
    builder
        .add_node(
            "step1",
            node_fn("step1", |mut s: Counter| async move {
                s.value += 1;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder.add_edge(START, "step1");
    builder.add_edge("step1", END);

    let placement = if fallback_allowed {
        NodePlacement::new("step1", "gpu")
    } else {
        NodePlacement::new("step1", "gpu").no_fallback()
    };
    builder.with_node_placement(placement).build().unwrap()
}

#[tokio::main]
async fn main() {
    // Registry with no "gpu" executor registered at all.
    let registry = ExecutorRegistry::new();

    let graph = build(true);
    let outcome = run_distributed(&graph, Counter::default(), &registry, DistributedRunOptions::default())
        .await
        .expect("fallback should let the local handler run step1");
    let state = outcome.into_state();
    println!("fallback allowed: value={}", state.value);
    assert_eq!(state.value, 1);

    let graph = build(false);
    let err = run_distributed(&graph, Counter::default(), &registry, DistributedRunOptions::default())
        .await
        .expect_err("no fallback and no registered executor must fail");
    println!("fallback disallowed: {err}");
    assert!(matches!(err, DistributedError::UnknownExecutor(name) if name == "gpu"));
}
