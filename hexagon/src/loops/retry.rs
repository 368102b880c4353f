//! `Retry`: exponential backoff with jitter and a configurable
//! `should_retry(err)` predicate. Delay doubles up to a cap; success returns
//! immediately; exhaustion returns the last error.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::execution::ExecutionError;

pub type ShouldRetry = Arc<dyn Fn(&ExecutionError) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub should_retry: ShouldRetry,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            should_retry: Arc::new(|_| true),
        }
    }
}

pub async fn retry<S, B, Fut>(state: S, config: &RetryConfig, mut body: B) -> Result<S, ExecutionError>
where
    S: Clone + Send + Debug + 'static,
    B: FnMut(S) -> Fut,
    Fut: Future<Output = Result<S, ExecutionError>>,
{
    let mut delay = config.base_delay;
    let mut attempt = 0u32;
    loop {
        match body(state.clone()).await {
            Ok(s) => return Ok(s),
            Err(err) => {
                if attempt >= config.max_retries || !(config.should_retry)(&err) {
                    return Err(err);
                }
                attempt += 1;
                let jitter_fraction: f64 = rand::random::<f64>() * 0.25;
                let sleep_for = delay + Duration::from_secs_f64(delay.as_secs_f64() * jitter_fraction);
                tracing::debug!(attempt, delay_ms = sleep_for.as_millis() as u64, error = %err, "retrying after failure");
                tokio::time::sleep(sleep_for).await;
                delay = (delay * 2).min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_sleeping() {
        let config = RetryConfig::default();
        let result = retry(0i32, &config, |s: i32| async move { Ok(s + 1) }).await.unwrap();
        assert_eq!(result, 1);
    }

    #[tokio::test]
    async fn retries_up_to_the_cap_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..Default::default()
        };
        let result = retry(0i32, &config, {
            let calls = calls.clone();
            move |s: i32| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(ExecutionError::handler_failed("flaky", "not yet"))
                    } else {
                        Ok(s + 1)
                    }
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..Default::default()
        };
        let err = retry(0i32, &config, |_s: i32| async move { Err(ExecutionError::handler_failed("always", "nope")) })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::HandlerFailed { .. }));
    }
}
