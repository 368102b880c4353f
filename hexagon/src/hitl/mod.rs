//! Human-in-the-loop: pause a run for external review and resume it once a
//! person (or another system) responds.
//!
//! Two ways to pause, unified under the same [`model::Interrupt`] record:
//! [`node::HitlNode`] blocks synchronously on an [`handler::InterruptHandler`]
//! from inside a single node, while any ordinary node returning
//! `NodeOutcome::Interrupt` pauses the *whole graph*, which
//! [`executor::HumanInTheLoopExecutor`] turns into a checkpoint plus an
//! interrupt record that an external caller resolves later.

mod error;
mod executor;
mod handler;
mod model;
mod node;
mod store;

pub use error::HitlError;
pub use executor::{HitlExecutorError, HitlOutcome, HumanInTheLoopExecutor};
pub use handler::{CallbackHandler, ChannelHandler, InterruptHandler};
pub use model::{Interrupt, InterruptStatus, InterruptType, ResponseAction};
pub use node::HitlNode;
pub use store::{InterruptStore, MemoryInterruptHandler};
