//! The `Runnable` six-mode contract (spec §4.9): a uniform execution
//! surface for embedding nodes, tools, or subgraphs, plus the resilience
//! wrappers (retry, fallback, circuit breaker) and async primitives
//! (`Promise`/`Future`, combinators) built on top of it.

mod circuit_breaker;
mod combinators;
mod contract;
mod error;
mod fallback;
mod future;
mod retry;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitState, OnStateChange, WithCircuitBreaker};
pub use combinators::{any, parallel, parallel_with_limit, race};
pub use contract::{Runnable, RunnableStream};
pub use error::RunnableError;
pub use fallback::{ExceptionsToHandle, WithFallback};
pub use future::{promise, Future, Promise};
pub use retry::{OnRetry, RetryOn, RetryPolicy, WithRetry};
