//! The `Node` trait: a named unit of work mapping state to state.
//!
//! Aligns with the teacher's `graph::Node<S>`, generalized with a
//! `RunContext` parameter so nodes can observe the streaming sender,
//! cancellation token, and hierarchical address segment stack (spec §4.2)
//! without every node needing its own ad-hoc plumbing.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::execution::{ExecutionError, InterruptSignal};
use crate::graph::run_context::RunContext;

/// What a node produces: either the next state, or a request to pause the
/// run and hand control back to an external collaborator (HITL, spec §4.6).
#[derive(Debug, Clone)]
pub enum NodeOutcome<S> {
    Next(S),
    Interrupt { state: S, signal: InterruptSignal },
}

impl<S> NodeOutcome<S> {
    pub fn into_state(self) -> S {
        match self {
            NodeOutcome::Next(s) => s,
            NodeOutcome::Interrupt { state, .. } => state,
        }
    }
}

/// Coarse classification of a node, stored alongside it for introspection
/// and visualization (spec §3 Node.kind). Execution dispatch does not branch
/// on this directly — HITL/loop/remote behavior comes from the node's own
/// `Node` impl — but tooling (debugger, analysis, dot/mermaid export) uses it
/// to render nodes differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Normal,
    Conditional,
    Loop,
    Hitl,
    Command,
    RemoteWrapped,
}

/// A named unit of work: receive state, return updated state (or an
/// interrupt request). Implemented directly for advanced node types (loops,
/// HITL, remote proxies); simple handlers use [`FnNode`] via [`node_fn`].
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn name(&self) -> &str;

    fn kind(&self) -> NodeKind {
        NodeKind::Normal
    }

    async fn run(&self, state: S, ctx: &RunContext<S>) -> Result<NodeOutcome<S>, ExecutionError>;
}

type BoxedHandlerFuture<S> = Pin<Box<dyn Future<Output = Result<S, ExecutionError>> + Send>>;

/// Adapts a plain async closure `Fn(S) -> Result<S, ExecutionError>` into a
/// [`Node`]. This is the common case; most graphs never implement `Node`
/// directly.
pub struct FnNode<S> {
    name: String,
    handler: Arc<dyn Fn(S) -> BoxedHandlerFuture<S> + Send + Sync>,
}

impl<S> FnNode<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, ExecutionError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(move |s| Box::pin(handler(s))),
        }
    }
}

#[async_trait]
impl<S> Node<S> for FnNode<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: S, _ctx: &RunContext<S>) -> Result<NodeOutcome<S>, ExecutionError> {
        (self.handler)(state).await.map(NodeOutcome::Next)
    }
}

/// Shorthand for `Arc::new(FnNode::new(name, handler))`, the common way to
/// register a node with [`crate::graph::GraphBuilder::add_node`].
pub fn node_fn<S, F, Fut>(name: impl Into<String>, handler: F) -> Arc<dyn Node<S>>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, ExecutionError>> + Send + 'static,
{
    Arc::new(FnNode::new(name, handler))
}
