//! HITL approval: `review` pauses for a human approval with a 50ms timeout.
//! A separate task plays the external approver, submitting a response before
//! the timeout elapses; the node resumes with the approved-path state update.

use std::sync::Arc;
use std::time::Duration;

use hexagon::execution::ExecutionError;
use hexagon::graph::{node_fn, GraphBuilder, Node, END, START};
use hexagon::hitl::{ChannelHandler, HitlNode, Interrupt, InterruptType, MemoryInterruptHandler, ResponseAction};
use hexagon::checkpoint::RunnableConfig;

#[derive(Clone, Debug, Default)]
struct Draft {
    text: String,
    approved: bool,
}

#[tokio::main]
async fn main() {
    let store = Arc::new(MemoryInterruptHandler::new());
    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let handler: Arc<dyn hexagon::hitl::InterruptHandler> = Arc::new(ChannelHandler::new(tx, store.clone()));

    let review_node: HitlNode<Draft> = HitlNode::new(
        "review",
        handler,
        |_s: &Draft| Interrupt::new("thread-1", "review-graph", "review", InterruptType::Approval).with_timeout(Duration::from_millis(50)),
        |mut s: Draft, response: serde_json::Value| async move {
            s.approved = response["approved"].as_bool().unwrap_or(false);
            if s.approved {
                s.text.push_str(" [approved]");
            }
            Ok::<_, ExecutionError>(s)
        },
    );

    let mut builder = GraphBuilder::<Draft>::new("review-graph");
    builder.add_node("draft", node_fn("draft", |mut s: Draft| async move {
        s.text = "hello world".to_string();
        Ok::<_, ExecutionError>(s)
    }))
    .unwrap();
    builder.add_node("review", Arc::new(review_node) as Arc<dyn Node<Draft>>).unwrap();
    builder.add_edge(START, "draft");
    builder.add_edge("draft", "review");
    builder.add_edge("review", END);
    let graph = builder.build().unwrap();

    // Plays the external approver: waits for the interrupt to arrive on the
    // channel, then resolves it well inside the 50ms timeout.
    let approver = tokio::spawn(async move {
        let pending = rx.recv().await.expect("the review node should request approval");
        store
            .resolve(&pending.id, serde_json::json!({"approved": true}), ResponseAction::Approve, "reviewer")
            .await
            .unwrap();
    });

    let executor = hexagon::executor::DagExecutor::new(graph);
    let outcome = executor.invoke(Draft::default(), RunnableConfig::default()).await.unwrap();
    approver.await.unwrap();

    let state = outcome.into_state();
    println!("approved={} text={:?}", state.approved, state.text);
    assert!(state.approved);
    assert!(state.text.ends_with("[approved]"));
}
