//! Errors from the interrupt store and handlers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HitlError {
    #[error("interrupt '{0}' not found")]
    NotFound(String),

    #[error("interrupt '{0}' is not pending")]
    NotPending(String),

    #[error("interrupt '{0}' timed out")]
    TimedOut(String),

    #[error("wait on interrupt was cancelled")]
    Cancelled,
}
