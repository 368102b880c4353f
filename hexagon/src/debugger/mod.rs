//! Time-travel debugger (spec §4.7): records a snapshot per node during a
//! run, then lets a caller step through, diff, branch, and export that
//! history independently of the executor that produced it.

mod debugger;
mod error;
mod executable;
mod model;
mod store;

pub use debugger::TimeTravelDebugger;
pub use error::DebuggerError;
pub use executable::Executable;
pub use model::{DiffEntry, Snapshot};
pub use store::{InMemorySnapshotStore, SnapshotStore};
