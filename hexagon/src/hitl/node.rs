//! [`HitlNode`]: a node that synchronously blocks on a human response via an
//! [`InterruptHandler`] before producing its next state.
//!
//! This is the "handler lives inside the node" flavor: the node builds a
//! request, hands it to the handler, and waits. For the "pause the whole
//! graph and resume later" flavor, any ordinary node can return
//! `NodeOutcome::Interrupt` directly — see [`crate::hitl::HumanInTheLoopExecutor`].

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::execution::ExecutionError;
use crate::graph::{Node, NodeKind, NodeOutcome, RunContext};
use crate::hitl::handler::InterruptHandler;
use crate::hitl::model::Interrupt;

type GateFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
type RequestFn<S> = Arc<dyn Fn(&S) -> Interrupt + Send + Sync>;
type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type ApplyFn<S> = Arc<dyn Fn(S, serde_json::Value) -> BoxFuture<Result<S, ExecutionError>> + Send + Sync>;

pub struct HitlNode<S> {
    name: String,
    gate: Option<GateFn<S>>,
    request: RequestFn<S>,
    handler: Arc<dyn InterruptHandler>,
    apply: ApplyFn<S>,
}

impl<S> HitlNode<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new<Req, Apply, Fut>(name: impl Into<String>, handler: Arc<dyn InterruptHandler>, request: Req, apply: Apply) -> Self
    where
        Req: Fn(&S) -> Interrupt + Send + Sync + 'static,
        Apply: Fn(S, serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, ExecutionError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            gate: None,
            request: Arc::new(request),
            handler,
            apply: Arc::new(move |s, v| Box::pin(apply(s, v))),
        }
    }

    /// Skips the human round-trip when `gate` returns false for the current state.
    pub fn with_gate<G>(mut self, gate: G) -> Self
    where
        G: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.gate = Some(Arc::new(gate));
        self
    }
}

#[async_trait]
impl<S> Node<S> for HitlNode<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Hitl
    }

    async fn run(&self, state: S, _ctx: &RunContext<S>) -> Result<NodeOutcome<S>, ExecutionError> {
        if let Some(gate) = &self.gate {
            if !gate(&state) {
                return Ok(NodeOutcome::Next(state));
            }
        }
        let request = (self.request)(&state);
        let response = (self.handler)
            .handle(request)
            .await
            .map_err(|err| ExecutionError::handler_failed(&self.name, err.to_string()))?;
        let new_state = (self.apply)(state, response).await?;
        Ok(NodeOutcome::Next(new_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hitl::handler::CallbackHandler;
    use crate::hitl::model::InterruptType;

    #[derive(Debug, Clone, Default)]
    struct ApprovalState {
        approved: bool,
    }

    #[tokio::test]
    async fn runs_the_handler_and_applies_its_response() {
        let handler: Arc<dyn InterruptHandler> = Arc::new(CallbackHandler::new(|_req| async move { Ok(serde_json::json!({"approved": true})) }));
        let node = HitlNode::new(
            "approve",
            handler,
            |_s: &ApprovalState| Interrupt::new("t1", "g", "approve", InterruptType::Approval),
            |mut s: ApprovalState, response: serde_json::Value| async move {
                s.approved = response["approved"].as_bool().unwrap_or(false);
                Ok(s)
            },
        );
        let ctx = RunContext::new(crate::checkpoint::RunnableConfig::default());
        let outcome = node.run(ApprovalState::default(), &ctx).await.unwrap();
        assert!(outcome.into_state().approved);
    }

    #[tokio::test]
    async fn gate_false_skips_the_handler_entirely() {
        let handler: Arc<dyn InterruptHandler> =
            Arc::new(CallbackHandler::new(|_req| async move { panic!("handler should not run") }));
        let node = HitlNode::new(
            "approve",
            handler,
            |_s: &ApprovalState| Interrupt::new("t1", "g", "approve", InterruptType::Approval),
            |s: ApprovalState, _response: serde_json::Value| async move { Ok(s) },
        )
        .with_gate(|_s: &ApprovalState| false);
        let ctx = RunContext::new(crate::checkpoint::RunnableConfig::default());
        let outcome = node.run(ApprovalState::default(), &ctx).await.unwrap();
        assert!(!outcome.into_state().approved);
    }
}
