//! Executors: the DAG single-frontier interpreter and the Pregel superstep
//! scheduler, both driving a `CompiledGraph`.

mod dag;
mod merger;
mod pregel;

pub use dag::{DagExecutor, DagOutcome};
pub use merger::{overwrite_by_node_order, LastWriteWins, Merger};
pub use pregel::{PregelConfig, PregelExecutor, PregelOutcome, TriggerMode};
