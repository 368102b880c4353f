//! Handlers turn a pending [`Interrupt`] into an external notification
//! (a callback, a channel send) and resolve once a response arrives.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::hitl::error::HitlError;
use crate::hitl::model::Interrupt;
use crate::hitl::store::InterruptStore;

#[async_trait]
pub trait InterruptHandler: Send + Sync {
    async fn handle(&self, request: Interrupt) -> Result<serde_json::Value, HitlError>;
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type HandlerFn = Arc<dyn Fn(Interrupt) -> BoxFuture<Result<serde_json::Value, HitlError>> + Send + Sync>;

/// Wraps an arbitrary async closure as an [`InterruptHandler`].
#[derive(Clone)]
pub struct CallbackHandler {
    callback: HandlerFn,
}

impl CallbackHandler {
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(Interrupt) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, HitlError>> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |req| Box::pin(callback(req))),
        }
    }
}

#[async_trait]
impl InterruptHandler for CallbackHandler {
    async fn handle(&self, request: Interrupt) -> Result<serde_json::Value, HitlError> {
        (self.callback)(request).await
    }
}

/// Publishes the interrupt on a channel for an external consumer (a UI, an
/// operator console) to pick up, then blocks on the store until it resolves.
pub struct ChannelHandler {
    sender: mpsc::Sender<Interrupt>,
    store: Arc<dyn InterruptStore>,
}

impl ChannelHandler {
    pub fn new(sender: mpsc::Sender<Interrupt>, store: Arc<dyn InterruptStore>) -> Self {
        Self { sender, store }
    }
}

#[async_trait]
impl InterruptHandler for ChannelHandler {
    async fn handle(&self, request: Interrupt) -> Result<serde_json::Value, HitlError> {
        let created = self.store.create(request).await;
        self.sender.send(created.clone()).await.map_err(|_| HitlError::Cancelled)?;
        let resolved = self.store.wait(&created.id, created.timeout).await?;
        Ok(resolved.response.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hitl::model::{InterruptType, ResponseAction};
    use crate::hitl::store::MemoryInterruptHandler;

    #[tokio::test]
    async fn callback_handler_invokes_the_closure() {
        let handler = CallbackHandler::new(|req: Interrupt| async move { Ok(serde_json::json!({"node": req.node})) });
        let result = handler
            .handle(Interrupt::new("t1", "g", "approve", InterruptType::Approval))
            .await
            .unwrap();
        assert_eq!(result["node"], "approve");
    }

    #[tokio::test]
    async fn channel_handler_resolves_after_store_resolve() {
        let store = Arc::new(MemoryInterruptHandler::new());
        let (tx, mut rx) = mpsc::channel(4);
        let handler = ChannelHandler::new(tx, store.clone());

        let handle_fut = handler.handle(Interrupt::new("t1", "g", "approve", InterruptType::Approval));
        tokio::pin!(handle_fut);

        let received = tokio::select! {
            r = &mut handle_fut => panic!("handle resolved before the interrupt was answered: {r:?}"),
            r = rx.recv() => r.unwrap(),
        };

        store
            .resolve(&received.id, serde_json::json!({"ok": true}), ResponseAction::Approve, "alice")
            .await
            .unwrap();

        let result = handle_fut.await.unwrap();
        assert_eq!(result["ok"], true);
    }
}
