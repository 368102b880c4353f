//! The interrupt-signal sentinel: how a node asks the run to pause.
//!
//! A plain [`Node`](crate::graph::Node) can return
//! [`NodeOutcome::Interrupt`](crate::graph::NodeOutcome::Interrupt) to
//! request a pause; the DAG/Pregel executors propagate it unchanged (spec
//! §4.2, §7 "Control-flow sentinels"). The richer `hitl` subsystem builds
//! full [`crate::hitl::Interrupt`] records on top of this lightweight
//! signal when it needs external correlation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptSignal {
    pub node: String,
    pub reason: String,
    #[serde(default)]
    pub payload: Value,
}

impl InterruptSignal {
    pub fn new(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            reason: reason.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
