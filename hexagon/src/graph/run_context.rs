//! Run context passed into nodes: config, streaming sender, cancellation,
//! and the hierarchical address stack (spec §4.2).

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::checkpoint::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode};

/// One segment of the hierarchical address built up as execution descends
/// into nodes (and, for subgraphs, into nested runs). Lets a debugger or
/// log line reconstruct "where" in a possibly-nested run an event happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSegment {
    pub kind: &'static str,
    pub name: String,
}

impl AddressSegment {
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            kind: "node",
            name: name.into(),
        }
    }
}

#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Config for the current run (thread_id, checkpoint, user_id, etc.).
    pub config: RunnableConfig,
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes (Values, Updates, Messages, Custom).
    pub stream_mode: HashSet<StreamMode>,
    /// Cancellation observed by long-lived operations (spec §5).
    pub cancel: CancellationToken,
    pub address: Arc<Vec<AddressSegment>>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
            cancel: CancellationToken::new(),
            address: Arc::new(Vec::new()),
        }
    }

    /// Returns a new context with `segment` pushed onto the address stack.
    /// Everything else (config, sender, cancellation) is shared.
    pub fn with_segment(&self, segment: AddressSegment) -> Self {
        let mut address = (*self.address).clone();
        address.push(segment);
        Self {
            config: self.config.clone(),
            stream_tx: self.stream_tx.clone(),
            stream_mode: self.stream_mode.clone(),
            cancel: self.cancel.clone(),
            address: Arc::new(address),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_segment_appends_without_mutating_parent() {
        let ctx: RunContext<i32> = RunContext::new(RunnableConfig::default());
        let child = ctx.with_segment(AddressSegment::node("a"));
        assert!(ctx.address.is_empty());
        assert_eq!(child.address.len(), 1);
        assert_eq!(child.address[0].name, "a");
    }
}
