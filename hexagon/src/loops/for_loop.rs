//! `For(n)`: iterate exactly `n` times with the index exposed to the body.

use std::fmt::Debug;
use std::future::Future;

use super::{apply_control, with_timeout, LoopConfig, LoopControl, LoopError};
use crate::execution::ExecutionError;

pub async fn for_n<S, B, Fut>(state: S, config: &LoopConfig, n: u64, mut body: B) -> Result<S, LoopError>
where
    S: Clone + Send + Debug + 'static,
    B: FnMut(S, u64) -> Fut,
    Fut: Future<Output = Result<LoopControl<S>, ExecutionError>>,
{
    with_timeout(config.timeout, async {
        let mut state = state;
        for i in 0..n {
            config.check_iteration(i)?;
            config.fire_iteration(i);
            let result = body(state.clone(), i).await;
            if let Some(final_state) = apply_control(&mut state, config, i, result)? {
                return Ok(final_state);
            }
        }
        config.fire_complete(n);
        Ok(state)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_exactly_n_times() {
        let config = LoopConfig::default();
        let result = for_n(0i32, &config, 4, |s: i32, i| async move { Ok(LoopControl::Next(s + i as i32)) })
            .await
            .unwrap();
        assert_eq!(result, 0 + 1 + 2 + 3);
    }

    #[tokio::test]
    async fn zero_iterations_returns_initial_state() {
        let config = LoopConfig::default();
        let result = for_n(7i32, &config, 0, |s: i32, _i| async move { Ok(LoopControl::Next(s + 1)) })
            .await
            .unwrap();
        assert_eq!(result, 7);
    }
}
