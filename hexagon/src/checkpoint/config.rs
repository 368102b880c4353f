//! Invoke config: thread_id, checkpoint_id, checkpoint_ns, user_id.
//!
//! Aligns with the teacher's `RunnableConfig` (`memory/config.rs`), carried
//! over with the same field shape since nothing about it is graph-specific.

#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Identifies the conversation/thread. Required when a checkpointer is attached.
    pub thread_id: Option<String>,
    /// Load state from this checkpoint instead of the latest (time travel / branch).
    pub checkpoint_id: Option<String>,
    /// Namespace for checkpoints, e.g. a subgraph. Default is empty.
    pub checkpoint_ns: String,
    /// Used by distributed/remote collaborators for multi-tenant isolation.
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_empty_optionals() {
        let c = RunnableConfig::default();
        assert!(c.thread_id.is_none());
        assert!(c.checkpoint_id.is_none());
        assert!(c.checkpoint_ns.is_empty());
        assert!(c.user_id.is_none());
    }
}
