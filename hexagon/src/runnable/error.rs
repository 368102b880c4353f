//! `Runnable` errors (spec §4.9).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RunnableError {
    #[error("runnable failed: {0}")]
    Failed(String),

    #[error("all fallbacks failed: {0:?}")]
    AllFallbacksFailed(Vec<String>),

    #[error("circuit is open")]
    CircuitOpen,

    #[error("max retries ({0}) exceeded: {1}")]
    MaxRetriesExceeded(u32, String),

    #[error("stream produced no items")]
    EmptyStream,

    #[error("runnable was cancelled")]
    Cancelled,

    #[error("runnable timed out after {0:?}")]
    Timeout(std::time::Duration),
}
