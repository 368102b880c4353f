//! Distributed execution (spec §4.8): dispatch individual nodes to remote
//! executors for the duration of a single run, with per-node fallback and
//! an HTTP reference transport.

mod error;
mod executor;
mod http;
#[cfg(feature = "http-server")]
mod http_server;
mod proxy;
mod registry;
mod run;

pub use error::DistributedError;
pub use executor::RemoteNodeExecutor;
pub use http::{HttpRemoteExecutor, HttpRemoteExecutorConfig};
#[cfg(feature = "http-server")]
pub use http_server::node_server_router;
pub use proxy::RemoteProxyNode;
pub use registry::ExecutorRegistry;
pub use run::{run_distributed, DistributedRunOptions};
