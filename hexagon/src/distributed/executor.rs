//! `RemoteNodeExecutor`: the contract a distributed-execution transport
//! must satisfy (spec §4.8 `Execute`/`Ping`/`Name`).

use async_trait::async_trait;

use crate::distributed::error::DistributedError;

#[async_trait]
pub trait RemoteNodeExecutor: Send + Sync {
    /// Runs `node_name` on the remote side against the given serialized
    /// state, returning the serialized result.
    async fn execute(&self, node_name: &str, serialized_state: Vec<u8>) -> Result<Vec<u8>, DistributedError>;

    async fn ping(&self) -> Result<(), DistributedError>;

    fn name(&self) -> &str;
}
