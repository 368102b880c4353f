//! `While`: evaluate the predicate before each iteration (zero or more runs).

use std::fmt::Debug;
use std::future::Future;

use super::{apply_control, with_timeout, LoopConfig, LoopControl, LoopError};
use crate::execution::ExecutionError;

pub async fn while_loop<S, P, B, Fut>(state: S, config: &LoopConfig, mut predicate: P, mut body: B) -> Result<S, LoopError>
where
    S: Clone + Send + Debug + 'static,
    P: FnMut(&S) -> bool,
    B: FnMut(S, u64) -> Fut,
    Fut: Future<Output = Result<LoopControl<S>, ExecutionError>>,
{
    with_timeout(config.timeout, async {
        let mut state = state;
        let mut i: u64 = 0;
        while predicate(&state) {
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
    async fn runs_zero_times_when_predicate_starts_false() {
        let config = LoopConfig::with_max_iterations(10);
        let result = while_loop(0i32, &config, |s| *s < 0, |s: i32, _i| async move { Ok(LoopControl::Next(s + 1)) })
            .await
            .unwrap();
        assert_eq!(result, 0);
    }

    #[tokio::test]
    async fn accumulates_until_predicate_false() {
        let config = LoopConfig::with_max_iterations(100);
        let result = while_loop(0i32, &config, |s| *s < 5, |s: i32, _i| async move { Ok(LoopControl::Next(s + 1)) })
            .await
            .unwrap();
        assert_eq!(result, 5);
    }

    #[tokio::test]
    async fn max_iterations_is_fatal() {
        let config = LoopConfig::with_max_iterations(3);
        let err = while_loop(0i32, &config, |_| true, |s: i32, _i| async move { Ok(LoopControl::Next(s + 1)) })
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::MaxIterationsReached(3)));
    }
}
