//! Interrupt store: `Create`/`Resolve`/`Wait`/`ListPending`/`List`, with an
//! in-memory implementation used by both the callback and channel handlers.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use crate::hitl::error::HitlError;
use crate::hitl::model::{Interrupt, ResponseAction};
use crate::telemetry;

#[async_trait]
pub trait InterruptStore: Send + Sync {
    /// Assigns an id if absent, sets status=pending and timestamps.
    async fn create(&self, interrupt: Interrupt) -> Interrupt;

    /// Refuses non-pending requests; maps `action` to a terminal status and
    /// wakes every waiter registered via `wait`.
    async fn resolve(&self, id: &str, response: serde_json::Value, action: ResponseAction, by: &str) -> Result<Interrupt, HitlError>;

    /// Returns immediately if already resolved; otherwise registers a wait
    /// and blocks until `resolve` wakes it, or `timeout` elapses.
    async fn wait(&self, id: &str, timeout: Option<Duration>) -> Result<Interrupt, HitlError>;

    async fn list_pending(&self) -> Vec<Interrupt>;

    async fn list(&self, thread_id: &str) -> Vec<Interrupt>;

    async fn get(&self, id: &str) -> Option<Interrupt>;
}

struct Inner {
    interrupts: HashMap<String, Interrupt>,
    waiters: HashMap<String, Vec<oneshot::Sender<Interrupt>>>,
    next_id: u64,
}

pub struct MemoryInterruptHandler {
    inner: Mutex<Inner>,
}

impl Default for MemoryInterruptHandler {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                interrupts: HashMap::new(),
                waiters: HashMap::new(),
                next_id: 0,
            }),
        }
    }
}

impl MemoryInterruptHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterruptStore for MemoryInterruptHandler {
    async fn create(&self, mut interrupt: Interrupt) -> Interrupt {
        let mut guard = self.inner.lock().await;
        if interrupt.id.is_empty() {
            guard.next_id += 1;
            interrupt.id = format!("interrupt-{}", guard.next_id);
        }
        interrupt.created_at = SystemTime::now();
        telemetry::interrupt_created(&interrupt.thread_id, &interrupt.id, &format!("{:?}", interrupt.interrupt_type));
        guard.interrupts.insert(interrupt.id.clone(), interrupt.clone());
        interrupt
    }

    async fn resolve(&self, id: &str, response: serde_json::Value, action: ResponseAction, by: &str) -> Result<Interrupt, HitlError> {
        let (resolved, waiters) = {
            let mut guard = self.inner.lock().await;
            let entry = guard.interrupts.get_mut(id).ok_or_else(|| HitlError::NotFound(id.to_string()))?;
            if !entry.is_pending() {
                return Err(HitlError::NotPending(id.to_string()));
            }
            entry.status = action.terminal_status();
            entry.response = Some(response);
            entry.resolved_at = Some(SystemTime::now());
            entry.resolver = Some(by.to_string());
            let resolved = entry.clone();
            let waiters = guard.waiters.remove(id).unwrap_or_default();
            (resolved, waiters)
        };
        telemetry::interrupt_resolved(id, &format!("{:?}", resolved.status));
        for waiter in waiters {
            let _ = waiter.send(resolved.clone());
        }
        Ok(resolved)
    }

    async fn wait(&self, id: &str, timeout: Option<Duration>) -> Result<Interrupt, HitlError> {
        let rx = {
            let mut guard = self.inner.lock().await;
            let entry = guard.interrupts.get(id).ok_or_else(|| HitlError::NotFound(id.to_string()))?;
            if !entry.is_pending() {
                return Ok(entry.clone());
            }
            let (tx, rx) = oneshot::channel();
            guard.waiters.entry(id.to_string()).or_default().push(tx);
            rx
        };

        let wait_id = id.to_string();
        match timeout {
            Some(d) => tokio::time::timeout(d, rx)
                .await
                .map_err(|_| HitlError::TimedOut(wait_id))?
                .map_err(|_| HitlError::Cancelled),
            None => rx.await.map_err(|_| HitlError::Cancelled),
        }
    }

    async fn list_pending(&self) -> Vec<Interrupt> {
        self.inner.lock().await.interrupts.values().filter(|i| i.is_pending()).cloned().collect()
    }

    async fn list(&self, thread_id: &str) -> Vec<Interrupt> {
        self.inner
            .lock()
            .await
            .interrupts
            .values()
            .filter(|i| i.thread_id == thread_id)
            .cloned()
            .collect()
    }

    async fn get(&self, id: &str) -> Option<Interrupt> {
        self.inner.lock().await.interrupts.get(id).cloned()
    }
}
