//! `Until`: the inverse of `While` — stop as soon as the predicate is true.

use std::fmt::Debug;
use std::future::Future;

use super::{apply_control, with_timeout, LoopConfig, LoopControl, LoopError};
use crate::execution::ExecutionError;

pub async fn until<S, P, B, Fut>(state: S, config: &LoopConfig, mut predicate: P, mut body: B) -> Result<S, LoopError>
where
    S: Clone + Send + Debug + 'static,
    P: FnMut(&S) -> bool,
    B: FnMut(S, u64) -> Fut,
    Fut: Future<Output = Result<LoopControl<S>, ExecutionError>>,
{
    with_timeout(config.timeout, async {
        let mut state = state;
        let mut i: u64 = 0;
        while !predicate(&state) {
            config.check_iteration(i)?;
            config.fire_iteration(i);
            let result = body(state.clone(), i).await;
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
    async fn stops_the_moment_predicate_is_true() {
        let config = LoopConfig::with_max_iterations(100);
        let result = until(0i32, &config, |s| *s >= 5, |s: i32, _i| async move { Ok(LoopControl::Next(s + 1)) })
            .await
            .unwrap();
        assert_eq!(result, 5);
    }
}
