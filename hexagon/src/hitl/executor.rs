//! [`HumanInTheLoopExecutor`]: runs a graph, and whenever a node pauses with
//! `DagOutcome::Interrupted`, persists a checkpoint and opens an [`Interrupt`]
//! record that an external caller resolves before the run continues.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::checkpoint::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};
use crate::execution::ExecutionError;
use crate::executor::dag::{DagExecutor, DagOutcome};
use crate::hitl::error::HitlError;
use crate::hitl::model::{Interrupt, InterruptType, ResponseAction};
use crate::hitl::store::InterruptStore;
use crate::telemetry;

#[derive(Debug, Error)]
pub enum HitlExecutorError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Hitl(#[from] HitlError),
    #[error("no checkpoint is associated with interrupt '{0}'")]
    NoCheckpointForInterrupt(String),
}

#[derive(Debug, Clone)]
pub enum HitlOutcome<S> {
    Completed(S),
    Interrupted { state: S, interrupt: Interrupt },
}

impl<S> HitlOutcome<S> {
    pub fn into_state(self) -> S {
        match self {
            HitlOutcome::Completed(s) => s,
            HitlOutcome::Interrupted { state, .. } => state,
        }
    }
}

pub struct HumanInTheLoopExecutor<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    dag: DagExecutor<S>,
    checkpointer: Arc<dyn Checkpointer<S>>,
    interrupts: Arc<dyn InterruptStore>,
}

impl<S> HumanInTheLoopExecutor<S>
where
    S: Clone + Send + Sync + Debug + serde::Serialize + 'static,
{
    pub fn new(dag: DagExecutor<S>, checkpointer: Arc<dyn Checkpointer<S>>, interrupts: Arc<dyn InterruptStore>) -> Self {
        Self { dag, checkpointer, interrupts }
    }

    pub async fn run(&self, thread_id: impl Into<String>, state0: S) -> Result<HitlOutcome<S>, HitlExecutorError> {
        let thread_id = thread_id.into();
        let config = RunnableConfig { thread_id: Some(thread_id.clone()), ..Default::default() };
        let outcome = self.dag.invoke(state0, config).await?;
        self.wrap_outcome(&thread_id, outcome).await
    }

    /// Resolves `interrupt_id` with `response`/`action`, then continues the
    /// run from the checkpoint the interrupt paused at.
    pub async fn resume(
        &self,
        interrupt_id: &str,
        response: serde_json::Value,
        action: ResponseAction,
        resolver: &str,
        apply_response: impl FnOnce(S, serde_json::Value) -> S,
    ) -> Result<HitlOutcome<S>, HitlExecutorError> {
        let resolved = self.interrupts.resolve(interrupt_id, response, action, resolver).await?;
        self.resume_from_resolved(resolved, apply_response).await
    }

    /// Like [`Self::resume`], but first blocks until `interrupt_id` is
    /// resolved by some other caller (a UI, an operator console).
    pub async fn wait_and_resume(
        &self,
        interrupt_id: &str,
        timeout: Option<Duration>,
        apply_response: impl FnOnce(S, serde_json::Value) -> S,
    ) -> Result<HitlOutcome<S>, HitlExecutorError> {
        let resolved = self.interrupts.wait(interrupt_id, timeout).await?;
        self.resume_from_resolved(resolved, apply_response).await
    }

    async fn resume_from_resolved(
        &self,
        resolved: Interrupt,
        apply_response: impl FnOnce(S, serde_json::Value) -> S,
    ) -> Result<HitlOutcome<S>, HitlExecutorError> {
        let checkpoint_id = resolved
            .context
            .get("checkpoint_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HitlExecutorError::NoCheckpointForInterrupt(resolved.id.clone()))?;
        let checkpoint = self.checkpointer.load_by_id(checkpoint_id).await?;
        let response = resolved.response.clone().unwrap_or(serde_json::Value::Null);
        let new_state = apply_response(checkpoint.state, response);

        let config = RunnableConfig { thread_id: Some(checkpoint.thread_id.clone()), ..Default::default() };
        let outcome = self.dag.invoke_from(checkpoint.current_node, new_state, config).await?;
        self.wrap_outcome(&checkpoint.thread_id, outcome).await
    }

    async fn wrap_outcome(&self, thread_id: &str, outcome: DagOutcome<S>) -> Result<HitlOutcome<S>, HitlExecutorError> {
        match outcome {
            DagOutcome::Completed(state) => Ok(HitlOutcome::Completed(state)),
            DagOutcome::Interrupted { state, signal } => {
                let checkpoint = Checkpoint::new(thread_id.to_string(), self.dag.graph().name().to_string(), signal.node.clone(), state.clone());
                let saved = self.checkpointer.save(checkpoint).await?;

                let interrupt = self
                    .interrupts
                    .create(
                        Interrupt::new(thread_id.to_string(), self.dag.graph().name().to_string(), signal.node.clone(), InterruptType::Custom)
                            .with_message(signal.reason.clone())
                            .with_context(serde_json::json!({ "checkpoint_id": saved.id, "payload": signal.payload })),
                    )
                    .await;
                telemetry::interrupt_created(thread_id, &interrupt.id, &format!("{:?}", interrupt.interrupt_type));
                Ok(HitlOutcome::Interrupted { state, interrupt })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemorySaver;
    use crate::execution::InterruptSignal;
    use crate::graph::{node_fn, GraphBuilder, NodeOutcome, START, END};
    use crate::hitl::store::MemoryInterruptHandler;
    use serde::Serialize;

    #[derive(Debug, Clone, Default, Serialize)]
    struct ReviewState {
        draft: String,
        approved: bool,
    }

    fn graph_with_one_gate() -> crate::graph::CompiledGraph<ReviewState> {
        let mut b = GraphBuilder::<ReviewState>::new("review");
        b.add_node(
            "draft",
            node_fn("draft", |mut s: ReviewState| async move {
                s.draft = "hello".to_string();
                Ok(s)
            }),
        )
        .unwrap();

        struct GateNode;
        #[async_trait::async_trait]
        impl crate::graph::Node<ReviewState> for GateNode {
            fn name(&self) -> &str {
                "gate"
            }
            async fn run(&self, state: ReviewState, _ctx: &crate::graph::RunContext<ReviewState>) -> Result<NodeOutcome<ReviewState>, ExecutionError> {
                if state.approved {
                    Ok(NodeOutcome::Next(state))
                } else {
                    Ok(NodeOutcome::Interrupt {
                        signal: InterruptSignal::new("gate", "needs human approval"),
                        state,
                    })
                }
            }
        }
        b.add_node("gate", Arc::new(GateNode)).unwrap();
        b.add_edge(START, "draft");
        b.add_edge("draft", "gate");
        b.add_edge("gate", END);
        b.build().unwrap()
    }

    #[tokio::test]
    async fn pauses_then_resumes_after_approval() {
        let graph = graph_with_one_gate();
        let dag = DagExecutor::new(graph);
        let saver: Arc<dyn Checkpointer<ReviewState>> = Arc::new(MemorySaver::new());
        let interrupts: Arc<dyn InterruptStore> = Arc::new(MemoryInterruptHandler::new());
        let executor = HumanInTheLoopExecutor::new(dag, saver, interrupts);

        let outcome = executor.run("thread-1", ReviewState::default()).await.unwrap();
        let interrupt = match outcome {
            HitlOutcome::Interrupted { interrupt, .. } => interrupt,
            HitlOutcome::Completed(_) => panic!("expected a pause at the gate"),
        };

        let resumed = executor
            .resume(&interrupt.id, serde_json::json!({"approved": true}), ResponseAction::Approve, "alice", |mut s, _resp| {
                s.approved = true;
                s
            })
            .await
            .unwrap();

        assert!(matches!(resumed, HitlOutcome::Completed(s) if s.approved));
    }
}
