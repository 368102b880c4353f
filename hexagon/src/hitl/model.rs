//! The `Interrupt` data model: a paused point in a run waiting on an
//! external collaborator's response.

use std::time::{Duration, SystemTime};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    Approval,
    Input,
    Review,
    Takeover,
    Correction,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Timeout,
    Cancelled,
}

/// The action a resolver takes; maps to a terminal [`InterruptStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Approve,
    Reject,
    Submit,
    Cancel,
}

impl ResponseAction {
    pub fn terminal_status(self) -> InterruptStatus {
        match self {
            ResponseAction::Approve => InterruptStatus::Approved,
            ResponseAction::Reject => InterruptStatus::Rejected,
            ResponseAction::Submit => InterruptStatus::Completed,
            ResponseAction::Cancel => InterruptStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Interrupt {
    pub id: String,
    pub thread_id: String,
    pub graph_name: String,
    pub node: String,
    pub interrupt_type: InterruptType,
    pub status: InterruptStatus,
    pub title: String,
    pub message: String,
    pub context: Value,
    /// Choices offered for an approval-type interrupt.
    pub options: Vec<String>,
    /// Schema describing the expected shape of an input-type interrupt's response.
    pub input_schema: Option<Value>,
    /// The value under review, for a review-type interrupt.
    pub current_output: Option<Value>,
    pub timeout: Option<Duration>,
    pub priority: i32,
    pub created_at: SystemTime,
    pub resolved_at: Option<SystemTime>,
    pub response: Option<Value>,
    pub resolver: Option<String>,
}

impl Interrupt {
    pub fn new(thread_id: impl Into<String>, graph_name: impl Into<String>, node: impl Into<String>, interrupt_type: InterruptType) -> Self {
        Self {
            id: String::new(),
            thread_id: thread_id.into(),
            graph_name: graph_name.into(),
            node: node.into(),
            interrupt_type,
            status: InterruptStatus::Pending,
            title: String::new(),
            message: String::new(),
            context: Value::Null,
            options: Vec::new(),
            input_schema: None,
            current_output: None,
            timeout: None,
            priority: 0,
            created_at: SystemTime::now(),
            resolved_at: None,
            response: None,
            resolver: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == InterruptStatus::Pending
    }
}
