//! Pregel cycle with AnyPredecessor: `think` increments a counter, `decide`
//! routes back to `think` until the counter reaches 3, then to END.

use std::collections::HashMap;
use std::sync::Arc;

use hexagon::checkpoint::RunnableConfig;
use hexagon::execution::ExecutionError;
use hexagon::executor::{PregelConfig, PregelExecutor};
use hexagon::graph::{node_fn, GraphBuilder, END, START};

#[derive(Clone, Debug, Default)]
struct Counter {
    value: i32,
}

fn build() -> hexagon::graph::CompiledGraph<Counter> {
    let mut builder = GraphBuilder::<Counter>::new("cycle");
    builder
        .add_node(
            "think",
            node_fn("think", |mut s: Counter| async move {
                s.value += 1;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder.add_node("decide", node_fn("decide", |s: Counter| async move { Ok::<_, ExecutionError>(s) })).unwrap();

    builder.add_edge(START, "think");
    builder.add_edge("think", "decide");
    let mut labels = HashMap::new();
    labels.insert("done".to_string(), END.to_string());
    labels.insert("think".to_string(), "think".to_string());
    builder.add_conditional_edge(
        "decide",
        Arc::new(|s: &Counter| if s.value >= 3 { "done".to_string() } else { "think".to_string() }),
        Some(labels),
    );
    builder.build().unwrap()
}

#[tokio::main]
async fn main() {
    let config = PregelConfig { max_supersteps: 10, ..Default::default() };
    let executor = PregelExecutor::with_last_write_wins(build(), config);
    let outcome = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap();
    let state = outcome.into_state();
    println!("counter settled at {}", state.value);
    assert_eq!(state.value, 3);
}
