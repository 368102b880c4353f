//! Checkpoint persistence errors, one enum shared by every saver backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread '{0}' has no checkpoints")]
    ThreadNotFound(String),

    #[error("checkpoint '{0}' not found")]
    CheckpointNotFound(String),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("failed to decode checkpoint '{id}': {reason}")]
    Decode { id: String, reason: String },

    #[error("io error: {0}")]
    Io(String),

    #[error("remote store transport failure: {0}")]
    RemoteTransport(String),
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        CheckpointError::Io(e.to_string())
    }
}
