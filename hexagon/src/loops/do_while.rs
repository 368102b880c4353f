//! `DoWhile`: evaluate the predicate after each iteration (at least one run).

use std::fmt::Debug;
use std::future::Future;

use super::{apply_control, with_timeout, LoopConfig, LoopControl, LoopError};
use crate::execution::ExecutionError;

pub async fn do_while<S, P, B, Fut>(state: S, config: &LoopConfig, mut predicate: P, mut body: B) -> Result<S, LoopError>
where
    S: Clone + Send + Debug + 'static,
    P: FnMut(&S) -> bool,
    B: FnMut(S, u64) -> Fut,
    Fut: Future<Output = Result<LoopControl<S>, ExecutionError>>,
{
    with_timeout(config.timeout, async {
        let mut state = state;
        let mut i: u64 = 0;
        loop {
            config.check_iteration(i)?;
            config.fire_iteration(i);
            let result = body(state.clone(), i).await;
            if let Some(final_state) = apply_control(&mut state, config, i, result)? {
                return Ok(final_state);
            }
            i += 1;
            if !predicate(&state) {
                break;
            }
        }
        config.fire_complete(i);
        Ok(state)
    })
    .await
}
