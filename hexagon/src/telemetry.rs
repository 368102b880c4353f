//! Structured logging for graph runs.
//!
//! Mirrors the density of the teacher's `graph::logging` module: one
//! `tracing` event per lifecycle transition (node start/end, superstep
//! boundaries, checkpoint saves, interrupt lifecycle), never inside hot
//! loops. Callers who want exporters (metrics, OpenTelemetry) attach their
//! own `tracing` subscriber; this crate only emits events.

use std::time::Duration;

pub fn node_start(node: &str) {
    tracing::debug!(node, "node start");
}

pub fn node_complete(node: &str, duration: Duration) {
    tracing::debug!(node, duration_ms = duration.as_millis() as u64, "node complete");
}

pub fn node_error(node: &str, error: &str) {
    tracing::warn!(node, error, "node failed");
}

pub fn graph_start(graph: &str) {
    tracing::info!(graph, "graph run start");
}

pub fn graph_complete(graph: &str, duration: Duration) {
    tracing::info!(graph, duration_ms = duration.as_millis() as u64, "graph run complete");
}

pub fn graph_error(graph: &str, error: &str) {
    tracing::error!(graph, error, "graph run failed");
}

pub fn superstep_start(step: u64, active: &[String]) {
    tracing::debug!(step, active = ?active, "superstep start");
}

pub fn superstep_complete(step: u64, duration: Duration) {
    tracing::debug!(step, duration_ms = duration.as_millis() as u64, "superstep complete");
}

pub fn checkpoint_saved(thread_id: &str, checkpoint_id: &str) {
    tracing::info!(thread_id, checkpoint_id, "checkpoint saved");
}

pub fn interrupt_created(thread_id: &str, interrupt_id: &str, kind: &str) {
    tracing::info!(thread_id, interrupt_id, kind, "interrupt created");
}

pub fn interrupt_resolved(interrupt_id: &str, status: &str) {
    tracing::info!(interrupt_id, status, "interrupt resolved");
}

pub fn circuit_state_change(from: &str, to: &str) {
    tracing::warn!(from, to, "circuit breaker state change");
}
