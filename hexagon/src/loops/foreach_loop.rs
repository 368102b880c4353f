//! `ForEach(itemsFn, body)`: iterate the sequence `itemsFn(state)` produces;
//! an empty sequence means zero iterations.

use std::fmt::Debug;
use std::future::Future;

use super::{apply_control, with_timeout, LoopConfig, LoopControl, LoopError};
use crate::execution::ExecutionError;

pub async fn for_each<S, T, ItemsFn, B, Fut>(state: S, config: &LoopConfig, items_fn: ItemsFn, mut body: B) -> Result<S, LoopError>
where
    S: Clone + Send + Debug + 'static,
    ItemsFn: FnOnce(&S) -> Vec<T>,
    B: FnMut(S, T, u64) -> Fut,
    Fut: Future<Output = Result<LoopControl<S>, ExecutionError>>,
{
    with_timeout(config.timeout, async {
        let mut state = state;
        let items = items_fn(&state);
        let mut i: u64 = 0;
        for item in items {
            config.check_iteration(i)?;
            config.fire_iteration(i);
            let result = body(state.clone(), item, i).await;
            if let Some(final_state) = apply_control(&mut state, config, i, result)? {
                return Ok(final_state);
            }
            i += 1;
        }
        config.fire_complete(i);
        Ok(state)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_sequence_is_zero_iterations() {
        let config = LoopConfig::default();
        let result = for_each(0i32, &config, |_s: &i32| Vec::<i32>::new(), |s: i32, item, _i| async move { Ok(LoopControl::Next(s + item)) })
            .await
            .unwrap();
        assert_eq!(result, 0);
    }

    #[tokio::test]
    async fn sums_items_in_order() {
        let config = LoopConfig::default();
        let result = for_each(
            0i32,
            &config,
            |_s: &i32| vec![1, 2, 3],
            |s: i32, item, _i| async move { Ok(LoopControl::Next(s + item)) },
        )
        .await
        .unwrap();
        assert_eq!(result, 6);
    }
}
