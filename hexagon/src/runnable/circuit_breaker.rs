//! `WithCircuitBreaker`: Closed/Open/HalfOpen state machine (spec §4.9
//! "Circuit breaker"). All state and counters live behind a single mutex so
//! a transition is one atomic step, mirroring the teacher's preference for
//! a guarded struct over a pile of independent atomics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::runnable::contract::Runnable;
use crate::runnable::error::RunnableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout: Duration::from_secs(30),
        }
    }
}

pub type OnStateChange = Arc<dyn Fn(CircuitState, CircuitState) + Send + Sync>;

struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

pub struct WithCircuitBreaker<R> {
    inner: R,
    config: CircuitBreakerConfig,
    on_state_change: Option<OnStateChange>,
    guard: Mutex<CircuitInner>,
}

impl<R> WithCircuitBreaker<R> {
    pub fn new(inner: R, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            config,
            on_state_change: None,
            guard: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
            }),
        }
    }

    pub fn with_on_state_change(mut self, callback: OnStateChange) -> Self {
        self.on_state_change = Some(callback);
        self
    }

    pub async fn state(&self) -> CircuitState {
        self.guard.lock().await.state
    }

    fn transition(&self, inner: &mut CircuitInner, to: CircuitState) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        if let Some(callback) = &self.on_state_change {
            callback(from, to);
        }
    }

    /// Checked at the start of every call: lazily flips Open to HalfOpen
    /// once the timeout has elapsed.
    async fn allow(&self) -> Result<(), RunnableError> {
        let mut inner = self.guard.lock().await;
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.config.open_timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.consecutive_successes = 0;
                    Ok(())
                } else {
                    Err(RunnableError::CircuitOpen)
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.guard.lock().await;
        inner.consecutive_failures = 0;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed);
                    inner.opened_at = None;
                }
            }
            CircuitState::Closed => {}
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.guard.lock().await;
        inner.consecutive_successes = 0;
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open);
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {}
        }
    }
}

#[async_trait]
impl<I, O, R> Runnable<I, O> for WithCircuitBreaker<R>
where
    I: Send + 'static,
    O: Send + 'static,
    R: Runnable<I, O>,
{
    async fn invoke(&self, input: I) -> Result<O, RunnableError> {
        self.allow().await?;
        match self.inner.invoke(input).await {
            Ok(output) => {
                self.record_success().await;
                Ok(output)
            }
            Err(err) => {
                self.record_failure().await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Toggle(Arc<AtomicBool>);

    #[async_trait]
    impl Runnable<i32, i32> for Toggle {
        async fn invoke(&self, input: i32) -> Result<i32, RunnableError> {
            if self.0.load(Ordering::SeqCst) {
                Ok(input)
            } else {
                Err(RunnableError::Failed("down".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures_then_rejects_immediately() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = WithCircuitBreaker::new(
            Toggle(healthy.clone()),
            CircuitBreakerConfig { failure_threshold: 2, success_threshold: 1, open_timeout: Duration::from_secs(60) },
        );
        assert!(breaker.invoke(1).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(breaker.invoke(1).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);

        let err = breaker.invoke(1).await.unwrap_err();
        assert!(matches!(err, RunnableError::CircuitOpen));
    }

    #[tokio::test]
    async fn half_open_closes_after_success_threshold() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = WithCircuitBreaker::new(
            Toggle(healthy.clone()),
            CircuitBreakerConfig { failure_threshold: 1, success_threshold: 2, open_timeout: Duration::from_millis(5) },
        );
        assert!(breaker.invoke(1).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(10)).await;
        healthy.store(true, Ordering::SeqCst);

        breaker.invoke(1).await.unwrap();
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        breaker.invoke(1).await.unwrap();
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_the_circuit() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = WithCircuitBreaker::new(
            Toggle(healthy.clone()),
            CircuitBreakerConfig { failure_threshold: 1, success_threshold: 2, open_timeout: Duration::from_millis(5) },
        );
        assert!(breaker.invoke(1).await.is_err());
        tokio::time::sleep(Duration::from_millis(10)).await;
        let err = breaker.invoke(1).await.unwrap_err();
        assert!(matches!(err, RunnableError::Failed(_)));
        assert_eq!(breaker.state().await, CircuitState::Open);
    }
}
