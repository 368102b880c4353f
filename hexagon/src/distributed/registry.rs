//! Maps logical executor names to `RemoteNodeExecutor` implementations and
//! runs batch health checks concurrently (spec §4.8 "registry").

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;

use crate::distributed::error::DistributedError;
use crate::distributed::executor::RemoteNodeExecutor;

#[derive(Default)]
pub struct ExecutorRegistry {
    executors: DashMap<String, Arc<dyn RemoteNodeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, executor: Arc<dyn RemoteNodeExecutor>) {
        self.executors.insert(executor.name().to_string(), executor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RemoteNodeExecutor>> {
        self.executors.get(name).map(|entry| entry.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.executors.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Pings every registered executor concurrently, returning the name and
    /// result for each.
    pub async fn health_check_all(&self) -> Vec<(String, Result<(), DistributedError>)> {
        let checks: Vec<_> = self
            .executors
            .iter()
            .map(|entry| {
                let name = entry.key().clone();
                let executor = entry.value().clone();
                async move { (name, executor.ping().await) }
            })
            .collect();
        join_all(checks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Always(&'static str, bool);

    #[async_trait]
    impl RemoteNodeExecutor for Always {
        async fn execute(&self, _node_name: &str, state: Vec<u8>) -> Result<Vec<u8>, DistributedError> {
            Ok(state)
        }

        async fn ping(&self) -> Result<(), DistributedError> {
            if self.1 {
                Ok(())
            } else {
                Err(DistributedError::UnknownExecutor(self.0.to_string()))
            }
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn health_check_all_reports_per_executor_result() {
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(Always("ok", true)));
        registry.register(Arc::new(Always("down", false)));

        let mut results = registry.health_check_all().await;
        results.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(results[0].0, "down");
        assert!(results[0].1.is_err());
        assert_eq!(results[1].0, "ok");
        assert!(results[1].1.is_ok());
    }

    #[test]
    fn get_returns_none_for_unregistered_name() {
        let registry = ExecutorRegistry::new();
        assert!(registry.get("missing").is_none());
    }
}
