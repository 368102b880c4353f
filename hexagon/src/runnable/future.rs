//! `Promise`/`Future`: a one-shot completion pair (spec §4.9 "Async"),
//! built on `tokio::sync::Notify` the way the checkpoint module builds its
//! waiters on `oneshot` — here there can be many waiters on one result, so
//! `Notify` fits better than a one-shot channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::runnable::error::RunnableError;

struct Shared<T> {
    notify: Notify,
    result: Mutex<Option<Result<T, RunnableError>>>,
}

pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

/// Creates a linked `Promise`/`Future` pair with no result yet.
pub fn promise<T>() -> (Promise<T>, Future<T>) {
    let shared = Arc::new(Shared { notify: Notify::new(), result: Mutex::new(None) });
    (Promise { shared: shared.clone() }, Future { shared })
}

impl<T> Promise<T> {
    pub async fn resolve(&self, value: T) {
        let mut guard = self.shared.result.lock().await;
        if guard.is_none() {
            *guard = Some(Ok(value));
            self.shared.notify.notify_waiters();
        }
    }

    pub async fn reject(&self, err: RunnableError) {
        let mut guard = self.shared.result.lock().await;
        if guard.is_none() {
            *guard = Some(Err(err));
            self.shared.notify.notify_waiters();
        }
    }
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Waits for the result, forever if necessary.
    pub async fn get(&self) -> Result<T, RunnableError> {
        loop {
            let notified = self.shared.notify.notified();
            {
                let guard = self.shared.result.lock().await;
                if let Some(result) = guard.as_ref() {
                    return result.clone();
                }
            }
            notified.await;
        }
    }

    pub async fn get_with_timeout(&self, timeout: Duration) -> Result<T, RunnableError> {
        tokio::time::timeout(timeout, self.get()).await.unwrap_or(Err(RunnableError::Timeout(timeout)))
    }

    pub async fn get_with_context(&self, cancel: &CancellationToken) -> Result<T, RunnableError> {
        tokio::select! {
            result = self.get() => result,
            _ = cancel.cancelled() => Err(RunnableError::Cancelled),
        }
    }

    /// Chains a transformation onto a successful result; a rejection
    /// propagates untouched.
    pub fn then<U, F, Fut>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = U> + Send,
    {
        let (next_promise, next_future) = promise::<U>();
        let this = self.clone();
        tokio::spawn(async move {
            match this.get().await {
                Ok(value) => next_promise.resolve(f(value).await).await,
                Err(err) => next_promise.reject(err).await,
            }
        });
        next_future
    }

    /// Recovers from a rejection by producing a replacement value; a
    /// successful result passes through untouched.
    pub fn catch<F, Fut>(&self, f: F) -> Future<T>
    where
        F: FnOnce(RunnableError) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = T> + Send,
    {
        let (next_promise, next_future) = promise::<T>();
        let this = self.clone();
        tokio::spawn(async move {
            match this.get().await {
                Ok(value) => next_promise.resolve(value).await,
                Err(err) => next_promise.resolve(f(err).await).await,
            }
        });
        next_future
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_the_resolved_value() {
        let (p, f) = promise::<i32>();
        p.resolve(42).await;
        assert_eq!(f.get().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn get_blocks_until_resolved_from_another_task() {
        let (p, f) = promise::<i32>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            p.resolve(7).await;
        });
        assert_eq!(f.get().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn get_with_timeout_times_out_if_never_resolved() {
        let (_p, f) = promise::<i32>();
        let err = f.get_with_timeout(Duration::from_millis(5)).await.unwrap_err();
        assert!(matches!(err, RunnableError::Timeout(_)));
    }

    #[tokio::test]
    async fn reject_propagates_as_an_error() {
        let (p, f) = promise::<i32>();
        p.reject(RunnableError::Failed("boom".to_string())).await;
        let err = f.get().await.unwrap_err();
        assert!(matches!(err, RunnableError::Failed(_)));
    }

    #[tokio::test]
    async fn then_maps_a_resolved_value() {
        let (p, f) = promise::<i32>();
        let mapped = f.then(|v| async move { v * 2 });
        p.resolve(21).await;
        assert_eq!(mapped.get().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn catch_recovers_a_rejection() {
        let (p, f) = promise::<i32>();
        let recovered = f.catch(|_err| async move { -1 });
        p.reject(RunnableError::Failed("down".to_string())).await;
        assert_eq!(recovered.get().await.unwrap(), -1);
    }
}
