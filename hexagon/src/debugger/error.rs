//! Time-travel debugger errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error("snapshot index {0} is out of range")]
    IndexOutOfRange(usize),

    #[error("node '{0}' failed during debugger run: {1}")]
    NodeFailed(String, String),

    #[error("no snapshot history to replay from")]
    EmptyHistory,

    #[error("serialization failed: {0}")]
    Serialization(String),
}
