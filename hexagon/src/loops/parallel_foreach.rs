//! `ParallelForEach(itemsFn, itemFn, combiner, maxConcurrency)`: bounded
//! workers; the collector joins per-item errors and combines successes into
//! one state via `combiner`.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::execution::ExecutionError;

pub async fn parallel_for_each<S, T, ItemFn, Combiner, Fut>(
    state: S,
    items: Vec<T>,
    max_concurrency: usize,
    item_fn: ItemFn,
    combiner: Combiner,
) -> Result<S, ExecutionError>
where
    S: Clone + Send + Sync + Debug + 'static,
    T: Send + 'static,
    ItemFn: Fn(S, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, ExecutionError>> + Send + 'static,
    Combiner: FnOnce(Vec<S>) -> S,
{
    let item_fn = Arc::new(item_fn);
    let results: Vec<Result<S, ExecutionError>> = stream::iter(items.into_iter().map(|item| {
        let state = state.clone();
        let item_fn = item_fn.clone();
        async move { item_fn(state, item).await }
    }))
    .buffer_unordered(max_concurrency.max(1))
    .collect()
    .await;

    let mut outputs = Vec::with_capacity(results.len());
    for result in results {
        outputs.push(result?);
    }
    Ok(combiner(outputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_all_items_and_combines_by_sum() {
        let result = parallel_for_each(
            0i64,
            vec![1, 2, 3, 4],
            2,
            |_state: i64, item: i64| async move { Ok(item * 10) },
            |outputs: Vec<i64>| outputs.into_iter().sum(),
        )
        .await
        .unwrap();
        assert_eq!(result, 100);
    }

    #[tokio::test]
    async fn first_error_is_surfaced() {
        let err = parallel_for_each(
            0i64,
            vec![1, 2, 3],
            3,
            |_state: i64, item: i64| async move {
                if item == 2 {
                    Err(ExecutionError::handler_failed("item", "boom"))
                } else {
                    Ok(item)
                }
            },
            |outputs: Vec<i64>| outputs.into_iter().sum(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ExecutionError::HandlerFailed { .. }));
    }
}
