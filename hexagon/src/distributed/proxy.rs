//! `RemoteProxyNode`: wraps a node's original handler with a remote call,
//! falling back to the original handler on failure when the node's
//! placement allows it (spec §4.8 step 2).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::distributed::error::DistributedError;
use crate::distributed::executor::RemoteNodeExecutor;
use crate::execution::ExecutionError;
use crate::graph::{Node, NodeKind, NodeOutcome, RunContext};

pub struct RemoteProxyNode<S> {
    name: String,
    original: Arc<dyn Node<S>>,
    executor: Arc<dyn RemoteNodeExecutor>,
    fallback_allowed: bool,
}

impl<S> RemoteProxyNode<S>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    pub fn new(original: Arc<dyn Node<S>>, executor: Arc<dyn RemoteNodeExecutor>, fallback_allowed: bool) -> Self {
        Self {
            name: original.name().to_string(),
            original,
            executor,
            fallback_allowed,
        }
    }

    async fn call_remote(&self, state: &S) -> Result<S, DistributedError> {
        let bytes = serde_json::to_vec(state).map_err(|e| DistributedError::Serialize(self.name.clone(), e.to_string()))?;
        let result = self.executor.execute(&self.name, bytes).await?;
        serde_json::from_slice(&result).map_err(|e| DistributedError::Deserialize(self.name.clone(), e.to_string()))
    }
}

#[async_trait]
impl<S> Node<S> for RemoteProxyNode<S>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::RemoteWrapped
    }

    async fn run(&self, state: S, ctx: &RunContext<S>) -> Result<NodeOutcome<S>, ExecutionError> {
        match self.call_remote(&state).await {
            Ok(new_state) => Ok(NodeOutcome::Next(new_state)),
            Err(err) if self.fallback_allowed => {
                tracing::warn!(node = %self.name, executor = %self.executor.name(), error = %err, "remote node failed, falling back to local handler");
                self.original.run(state, ctx).await
            }
            Err(err) => Err(ExecutionError::HandlerFailed {
                node: self.name.clone(),
                source: DistributedError::NoFallback {
                    node: self.name.clone(),
                    executor: self.executor.name().to_string(),
                    source: err.to_string(),
                }
                .to_string(),
            }),
        }
    }
}
