//! Compiled, executable graph.
//!
//! Immutable after `GraphBuilder::build`, with one exception: distributed
//! execution needs to run a variant of the graph with some node handlers
//! swapped for remote proxies. Rather than mutate-then-restore-on-drop,
//! `with_node_overrides` returns a *new* `CompiledGraph` sharing everything
//! else via `Arc`; the original is never touched, so handlers are always
//! back to normal once a distributed run returns — by construction, not by
//! a cleanup scope that could be skipped on a panic.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::checkpoint::Checkpointer;
use crate::graph::builder::{GraphBuilder, END, START};
use crate::graph::compile_error::GraphError;
use crate::graph::conditional::ConditionalEdgeGroup;
use crate::graph::edge::Edge;
use crate::graph::node::Node;
use crate::graph::placement::NodePlacement;
use crate::graph::plan::{build_plan, static_adjacency_from_edges, ExecutionPlan};

/// Aggregate per-node execution statistics, updated by the DAG and Pregel
/// executors as they run.
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub total_runs: u64,
    pub node_executions: HashMap<String, u64>,
    pub node_total_duration: HashMap<String, Duration>,
    pub last_execution: HashMap<String, std::time::SystemTime>,
}

impl GraphStats {
    pub fn record_node(&mut self, node: &str, duration: Duration) {
        *self.node_executions.entry(node.to_string()).or_insert(0) += 1;
        *self
            .node_total_duration
            .entry(node.to_string())
            .or_insert(Duration::ZERO) += duration;
        self.last_execution
            .insert(node.to_string(), std::time::SystemTime::now());
    }

    pub fn average_duration(&self, node: &str) -> Option<Duration> {
        let total = self.node_total_duration.get(node)?;
        let count = self.node_executions.get(node).copied().unwrap_or(0);
        if count == 0 {
            None
        } else {
            Some(*total / count as u32)
        }
    }
}

#[derive(Clone)]
pub struct CompiledGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(crate) name: Arc<str>,
    pub(crate) nodes: Arc<HashMap<String, Arc<dyn Node<S>>>>,
    pub(crate) edges: Arc<Vec<Edge>>,
    pub(crate) adjacency: Arc<HashMap<String, Vec<String>>>,
    pub(crate) conditional_edges: Arc<HashMap<String, Vec<ConditionalEdgeGroup<S>>>>,
    pub(crate) entry_point: Arc<str>,
    pub(crate) finish_point: Option<Arc<str>>,
    pub(crate) metadata: Arc<HashMap<String, Value>>,
    pub(crate) node_placements: Arc<HashMap<String, NodePlacement>>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(crate) plan: Arc<ExecutionPlan>,
    pub(crate) stats: Arc<RwLock<GraphStats>>,
}

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(crate) fn from_builder(builder: GraphBuilder<S>, entry_point: String) -> Result<Self, GraphError> {
        let (name, nodes, edges, conditional_edges, finish_point, metadata, node_placements, checkpointer) =
            builder.into_parts();

        let node_names: Vec<String> = nodes.keys().cloned().collect();
        let conditional_targets: HashMap<String, Vec<String>> = conditional_edges
            .iter()
            .map(|(from, groups)| {
                let targets: Vec<String> = groups
                    .iter()
                    .filter_map(|g| g.label_map.as_ref())
                    .flat_map(|m| m.values().cloned())
                    .collect();
                (from.clone(), targets)
            })
            .collect();

        let adjacency = static_adjacency_from_edges(&edges, &HashMap::new());
        let static_adjacency = static_adjacency_from_edges(&edges, &conditional_targets);
        let plan = build_plan(&node_names, &static_adjacency, &entry_point);

        Ok(Self {
            name: name.into(),
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
            adjacency: Arc::new(adjacency),
            conditional_edges: Arc::new(conditional_edges),
            entry_point: entry_point.into(),
            finish_point: finish_point.map(Into::into),
            metadata: Arc::new(metadata),
            node_placements: Arc::new(node_placements),
            checkpointer,
            plan: Arc::new(plan),
            stats: Arc::new(RwLock::new(GraphStats::default())),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn finish_point(&self) -> Option<&str> {
        self.finish_point.as_deref()
    }

    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node<S>>> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> &HashMap<String, Arc<dyn Node<S>>> {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn adjacency(&self) -> &HashMap<String, Vec<String>> {
        &self.adjacency
    }

    pub fn conditional_edges_for(&self, node: &str) -> Option<&[ConditionalEdgeGroup<S>]> {
        self.conditional_edges.get(node).map(|v| v.as_slice())
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn node_placements(&self) -> &HashMap<String, NodePlacement> {
        &self.node_placements
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    pub async fn stats(&self) -> GraphStats {
        self.stats.read().await.clone()
    }

    pub(crate) async fn record_stats(&self, node: &str, duration: Duration) {
        self.stats.write().await.record_node(node, duration);
    }

    pub(crate) async fn record_run_started(&self) {
        self.stats.write().await.total_runs += 1;
    }

    /// The next node following a plain edge: the first plain adjacency entry
    /// for `from`. DAG routing only ever takes this one.
    pub fn first_plain_successor(&self, from: &str) -> Option<&str> {
        self.adjacency.get(from).and_then(|v| v.first()).map(|s| s.as_str())
    }

    /// Every outgoing plain successor, used for Pregel fan-out and for
    /// computing in-degree for all-predecessors triggering.
    pub fn plain_successors(&self, from: &str) -> &[String] {
        self.adjacency.get(from).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_end(&self, name: &str) -> bool {
        name == END
    }

    pub const START: &'static str = START;
    pub const END: &'static str = END;

    /// A new compiled graph sharing all structure except `overrides` node
    /// handlers; used by `distributed::run_distributed`. The receiver is
    /// never mutated.
    pub fn with_node_overrides(&self, overrides: HashMap<String, Arc<dyn Node<S>>>) -> Self {
        let mut nodes = (*self.nodes).clone();
        for (name, node) in overrides {
            nodes.insert(name, node);
        }
        Self {
            nodes: Arc::new(nodes),
            ..self.clone()
        }
    }
}
