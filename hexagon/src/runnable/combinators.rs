//! Future combinators (spec §4.9 "Async"): `parallel`, `parallel_with_limit`,
//! `race`, `any`, operating over `Future<T>` handles.

use futures::stream::{self, StreamExt};

use crate::runnable::error::RunnableError;
use crate::runnable::future::Future as RunnableFuture;

pub async fn parallel<T>(futures: Vec<RunnableFuture<T>>) -> Result<Vec<T>, RunnableError>
where
    T: Clone + Send + Sync + 'static,
{
    futures::future::join_all(futures.iter().map(|f| f.get())).await.into_iter().collect()
}

pub async fn parallel_with_limit<T>(futures: Vec<RunnableFuture<T>>, limit: usize) -> Result<Vec<T>, RunnableError>
where
    T: Clone + Send + Sync + 'static,
{
    stream::iter(futures.iter().map(|f| f.get())).buffered(limit.max(1)).collect::<Vec<_>>().await.into_iter().collect()
}

/// First future to complete wins, success or failure.
pub async fn race<T>(futures: Vec<RunnableFuture<T>>) -> Result<T, RunnableError>
where
    T: Clone + Send + Sync + 'static,
{
    if futures.is_empty() {
        return Err(RunnableError::EmptyStream);
    }
    let pending: Vec<_> = futures.iter().map(|f| Box::pin(f.get())).collect();
    let (result, _index, _rest) = futures::future::select_all(pending).await;
    result
}

/// First future to succeed wins; if all fail, their errors are aggregated.
pub async fn any<T>(futures: Vec<RunnableFuture<T>>) -> Result<T, RunnableError>
where
    T: Clone + Send + Sync + 'static,
{
    if futures.is_empty() {
        return Err(RunnableError::EmptyStream);
    }
    let mut pending: Vec<_> = futures.iter().map(|f| Box::pin(f.get())).collect();
    let mut errors = Vec::new();
    while !pending.is_empty() {
        let (result, _index, rest) = futures::future::select_all(pending).await;
        match result {
            Ok(value) => return Ok(value),
            Err(err) => {
                errors.push(err.to_string());
                pending = rest;
            }
        }
    }
    Err(RunnableError::AllFallbacksFailed(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runnable::future::promise;
    use std::time::Duration;

    #[tokio::test]
    async fn parallel_collects_all_results_in_order() {
        let (p1, f1) = promise::<i32>();
        let (p2, f2) = promise::<i32>();
        p1.resolve(1).await;
        p2.resolve(2).await;
        let results = parallel(vec![f1, f2]).await.unwrap();
        assert_eq!(results, vec![1, 2]);
    }

    #[tokio::test]
    async fn race_returns_the_first_to_complete() {
        let (p1, f1) = promise::<i32>();
        let (p2, f2) = promise::<i32>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            p1.resolve(1).await;
        });
        p2.resolve(2).await;
        let winner = race(vec![f1, f2]).await.unwrap();
        assert_eq!(winner, 2);
    }

    #[tokio::test]
    async fn any_skips_failures_and_returns_first_success() {
        let (p1, f1) = promise::<i32>();
        let (p2, f2) = promise::<i32>();
        p1.reject(RunnableError::Failed("down".to_string())).await;
        p2.resolve(9).await;
        let winner = any(vec![f1, f2]).await.unwrap();
        assert_eq!(winner, 9);
    }

    #[tokio::test]
    async fn any_aggregates_errors_when_everything_fails() {
        let (p1, f1) = promise::<i32>();
        let (p2, f2) = promise::<i32>();
        p1.reject(RunnableError::Failed("a".to_string())).await;
        p2.reject(RunnableError::Failed("b".to_string())).await;
        let err = any(vec![f1, f2]).await.unwrap_err();
        assert!(matches!(err, RunnableError::AllFallbacksFailed(errors) if errors.len() == 2));
    }
}
