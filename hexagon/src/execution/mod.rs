//! Shared execution primitives used by both `graph::Node` and the executors.

mod error;
mod signal;

pub use error::ExecutionError;
pub use signal::InterruptSignal;
