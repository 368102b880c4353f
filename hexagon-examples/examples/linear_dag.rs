//! Linear three-step DAG: A increments a counter, B increments it again, C
//! appends to a path. Runs once via `invoke`, then again via `stream` to show
//! the NodeStart/NodeEnd/End event sequence a caller gets for free.

use std::collections::HashSet;

use hexagon::checkpoint::RunnableConfig;
use hexagon::execution::ExecutionError;
use hexagon::executor::DagExecutor;
use hexagon::graph::{node_fn, GraphBuilder, END, START};
use hexagon::stream::{StreamMode, StreamEvent};

#[derive(Clone, Debug, Default)]
struct Counting {
    counter: i32,
    path: String,
}

fn build() -> hexagon::graph::CompiledGraph<Counting> {
    let mut builder = GraphBuilder::<Counting>::new("linear");
    builder
        .add_node(
            "a",
            node_fn("a", |mut s: Counting| async move {
                s.counter = 1;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder
        .add_node(
            "b",
            node_fn("b", |mut s: Counting| async move {
                s.counter += 1;
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder
        .add_node(
            "c",
            node_fn("c", |mut s: Counting| async move {
                s.path.push_str("abc");
                Ok::<_, ExecutionError>(s)
            }),
        )
        .unwrap();
    builder.add_edge(START, "a");
    builder.add_edge("a", "b");
    builder.add_edge("b", "c");
    builder.add_edge("c", END);
    builder.build().unwrap()
}

#[tokio::main]
async fn main() {
    let executor = DagExecutor::new(build());

    let outcome = executor.invoke(Counting::default(), RunnableConfig::default()).await.unwrap();
    let state = outcome.into_state();
    println!("invoke result: counter={} path={:?}", state.counter, state.path);
    assert_eq!(state.counter, 2);
    assert_eq!(state.path, "abc");

    let mut modes = HashSet::new();
    modes.insert(StreamMode::Values);
    let mut events = executor.stream(Counting::default(), RunnableConfig::default(), modes);
    use tokio_stream::StreamExt;
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::NodeStart(node) => println!("-> {node} started"),
            StreamEvent::NodeEnd { node, state } => println!("<- {node} ended, counter={}", state.counter),
            StreamEvent::End(state) => println!("run finished, path={:?}", state.path),
            other => println!("{other:?}"),
        }
    }
}
