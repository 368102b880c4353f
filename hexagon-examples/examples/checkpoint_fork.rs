//! Checkpoint fork: run thread T1 to completion, then fork the first
//! checkpoint onto a new branch with a mutated state and resume it.

use std::sync::Arc;

use hexagon::checkpoint::{CheckpointRunner, MemorySaver, RunnerConfig};
use hexagon::execution::ExecutionError;
use hexagon::graph::{node_fn, GraphBuilder, END, START};

#[derive(Clone, Debug, Default)]
struct Counter {
    value: i32,
}

fn build() -> hexagon::graph::CompiledGraph<Counter> {
    let mut builder = GraphBuilder::<Counter>::new("forkable");
    builder
        .add_node(
            "a",
            node_fn("a", |mut s: Counter| async move {
                s.value += 1;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder
        .add_node(
            "b",
            node_fn("b", |mut s: Counter| async move {
                s.value += 10;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder.add_edge(START, "a");
    builder.add_edge("a", "b");
    builder.add_edge("b", END);
    builder.build().unwrap()
}

#[tokio::main]
async fn main() {
    let saver = Arc::new(MemorySaver::<Counter>::new());
    let runner = CheckpointRunner::new(build(), saver.clone(), RunnerConfig::default());

    let completed = runner.run("T1", Counter::default()).await.unwrap();
    println!("T1 completed with value={}", completed.into_state().value);

    let history = saver.list("T1").await.unwrap();
    let first_checkpoint = history.first().expect("at least one auto-saved checkpoint").checkpoint_id.clone();

    let forked = runner
        .fork(&first_checkpoint, "exp", |mut s: Counter| {
            s.value += 1000;
            s
        })
        .await
        .unwrap();
    let state = forked.into_state();
    println!("branch 'exp' resumed at value={}", state.value);
    assert!(state.value >= 1000);
}
