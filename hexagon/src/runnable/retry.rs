//! `WithRetry`: wraps a `Runnable` with capped exponential backoff and
//! jitter (spec §4.9 "Retry"), mirroring `loops::retry`'s algorithm but as
//! a `Runnable` decorator rather than a free function over loop state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::runnable::contract::Runnable;
use crate::runnable::error::RunnableError;

pub type RetryOn = Arc<dyn Fn(&RunnableError) -> bool + Send + Sync>;
pub type OnRetry = Arc<dyn Fn(u32, &RunnableError) + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub retry_on: RetryOn,
    pub on_retry: Option<OnRetry>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            retry_on: Arc::new(|_| true),
            on_retry: None,
        }
    }
}

pub struct WithRetry<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R> WithRetry<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<I, O, R> Runnable<I, O> for WithRetry<R>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
    R: Runnable<I, O>,
{
    async fn invoke(&self, input: I) -> Result<O, RunnableError> {
        let mut delay = self.policy.base_delay;
        let mut attempt = 0u32;
        loop {
            match self.inner.invoke(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(err) => {
                    if attempt >= self.policy.max_retries || !(self.policy.retry_on)(&err) {
                        return Err(RunnableError::MaxRetriesExceeded(attempt, err.to_string()));
                    }
                    if let Some(on_retry) = &self.policy.on_retry {
                        on_retry(attempt, &err);
                    }
                    attempt += 1;
                    let jitter_fraction: f64 = rand::random::<f64>() * 0.25;
                    let sleep_for = delay + Duration::from_secs_f64(delay.as_secs_f64() * jitter_fraction);
                    tokio::time::sleep(sleep_for).await;
                    delay = (delay * 2).min(self.policy.max_delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: Arc<AtomicU32>,
        fail_first: u32,
    }

    #[async_trait]
    impl Runnable<i32, i32> for Flaky {
        async fn invoke(&self, input: i32) -> Result<i32, RunnableError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(RunnableError::Failed("not yet".to_string()))
            } else {
                Ok(input + 1)
            }
        }
    }

    #[tokio::test]
    async fn retries_until_success_within_the_cap() {
        let calls = Arc::new(AtomicU32::new(0));
        let runnable = WithRetry::new(
            Flaky { calls: calls.clone(), fail_first: 2 },
            RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                ..Default::default()
            },
        );
        let result = runnable.invoke(41).await.unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_max_retries_exceeded() {
        let calls = Arc::new(AtomicU32::new(0));
        let runnable = WithRetry::new(
            Flaky { calls, fail_first: 100 },
            RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                ..Default::default()
            },
        );
        let err = runnable.invoke(0).await.unwrap_err();
        assert!(matches!(err, RunnableError::MaxRetriesExceeded(1, _)));
    }
}
