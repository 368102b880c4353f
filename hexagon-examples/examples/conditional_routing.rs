//! Conditional routing: `check` routes to `high` when counter > 5, `low`
//! otherwise, using a label-map conditional edge group.

use std::collections::HashMap;
use std::sync::Arc;

use hexagon::checkpoint::RunnableConfig;
use hexagon::execution::ExecutionError;
use hexagon::executor::DagExecutor;
use hexagon::graph::{node_fn, GraphBuilder, END, START};

#[derive(Clone, Debug, Default)]
struct Routed {
    counter: i32,
    path: String,
}

fn build() -> hexagon::graph::CompiledGraph<Routed> {
    let mut builder = GraphBuilder::<Routed>::new("conditional");
    builder.add_node("check", node_fn("check", |s: Routed| async move { Ok::<_, ExecutionError>(s) })).unwrap();
    builder
        .add_node(
            "high",
            node_fn("high", |mut s: Routed| async move {
                s.path.push('H');
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder
        .add_node(
            "low",
            node_fn("low", |mut s: Routed| async move {
                s.path.push('L');
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();

    builder.add_edge(START, "check");
    let mut labels = HashMap::new();
    labels.insert("high".to_string(), "high".to_string());
    labels.insert("low".to_string(), "low".to_string());
    builder.add_conditional_edge(
        "check",
        Arc::new(|s: &Routed| if s.counter > 5 { "high".to_string() } else { "low".to_string() }),
        Some(labels),
    );
    builder.add_edge("high", END);
    builder.add_edge("low", END);
    builder.build().unwrap()
}

#[tokio::main]
async fn main() {
    let executor = DagExecutor::new(build());
    let outcome = executor.invoke(Routed { counter: 10, path: String::new() }, RunnableConfig::default()).await.unwrap();
    let state = outcome.into_state();
    println!("path={:?}", state.path);
    assert_eq!(state.path, "H");
}
