//! Loop primitives: bounded, cancellable iteration wrapping a body handler,
//! plus the loop-back-edge machinery a compiled conditional edge routes
//! through (`GraphBuilder::add_loop_back_edge`).
//!
//! Every variant shares [`LoopConfig`] (iteration cap, wall-clock timeout,
//! error policy, lifecycle callbacks) and the [`LoopControl`] sentinel a body
//! handler returns to signal `Continue`/`Break` without that choice leaking
//! out as an error.

mod do_while;
mod for_loop;
mod foreach_loop;
mod parallel_foreach;
mod retry;
mod until_loop;
mod while_loop;

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::execution::ExecutionError;

pub use do_while::do_while;
pub use for_loop::for_n;
pub use foreach_loop::for_each;
pub use parallel_foreach::parallel_for_each;
pub use retry::{retry, RetryConfig};
pub use until_loop::until;
pub use while_loop::while_loop;

/// What a loop body returns: the next state to continue with, a request to
/// discard this iteration's update and keep looping, or a request to apply
/// an update and stop.
#[derive(Debug, Clone)]
pub enum LoopControl<S> {
    Next(S),
    Continue,
    Break(S),
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("loop exceeded {0} iterations")]
    MaxIterationsReached(u64),
    #[error("loop exceeded wall-clock timeout of {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Handler(#[from] ExecutionError),
}

pub type IterationCallback = Arc<dyn Fn(u64) + Send + Sync>;
pub type BreakCallback = Arc<dyn Fn(u64, &str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct LoopConfig {
    /// 0 means unbounded.
    pub max_iterations: u64,
    pub timeout: Option<Duration>,
    /// On a body error, stop the loop and return the state as of the last
    /// successful iteration instead of propagating the error.
    pub break_on_error: bool,
    /// On a body error, discard the iteration and keep looping.
    pub continue_on_error: bool,
    pub on_iteration: Option<IterationCallback>,
    pub on_break: Option<BreakCallback>,
    pub on_complete: Option<IterationCallback>,
}

impl LoopConfig {
    pub fn with_max_iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            ..Default::default()
        }
    }

    fn check_iteration(&self, i: u64) -> Result<(), LoopError> {
        if self.max_iterations != 0 && i >= self.max_iterations {
            return Err(LoopError::MaxIterationsReached(self.max_iterations));
        }
        Ok(())
    }

    fn fire_iteration(&self, i: u64) {
        if let Some(cb) = &self.on_iteration {
            cb(i);
        }
    }

    fn fire_break(&self, i: u64, reason: &str) {
        if let Some(cb) = &self.on_break {
            cb(i, reason);
        }
    }

    fn fire_complete(&self, i: u64) {
        if let Some(cb) = &self.on_complete {
            cb(i);
        }
    }
}

/// Default max iterations (spec: 1000) for callers building a `LoopConfig`
/// field by field rather than via `with_max_iterations`.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1000;

async fn with_timeout<T, Fut>(timeout: Option<Duration>, fut: Fut) -> Result<T, LoopError>
where
    Fut: Future<Output = Result<T, LoopError>>,
{
    match timeout {
        Some(d) => tokio::time::timeout(d, fut).await.map_err(|_| LoopError::Timeout(d))?,
        None => fut.await,
    }
}

/// Shared iteration-outcome handling: applies `LoopControl`, the error
/// policy, and the iteration/break callbacks. Returns `Some(state)` when the
/// loop should stop (break or error-as-break), `None` to keep iterating.
fn apply_control<S>(
    state: &mut S,
    config: &LoopConfig,
    i: u64,
    result: Result<LoopControl<S>, ExecutionError>,
) -> Result<Option<S>, LoopError>
where
    S: Clone + Send + Debug + 'static,
{
    match result {
        Ok(LoopControl::Next(s)) => {
            *state = s;
            Ok(None)
        }
        Ok(LoopControl::Continue) => Ok(None),
        Ok(LoopControl::Break(s)) => {
            config.fire_break(i, "break");
            Ok(Some(s))
        }
        Err(err) if config.continue_on_error => {
            tracing::debug!(iteration = i, error = %err, "loop body error, continuing");
            Ok(None)
        }
        Err(err) if config.break_on_error => {
            config.fire_break(i, "error");
            Ok(Some(state.clone()))
        }
        Err(err) => Err(LoopError::Handler(err)),
    }
}
