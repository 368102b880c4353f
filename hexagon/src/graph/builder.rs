//! Declarative graph assembly (spec §4.1). Mirrors the teacher's
//! `StateGraph` builder shape (`add_node`/`add_edge`, fluent `with_*`
//! attachments, `compile`/`build`), generalized to conditional edges,
//! multiple plain edges per node (Pregel fan-out), loop-back edges, node
//! placements, and an explicit entry/finish point.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use crate::checkpoint::Checkpointer;
use crate::graph::compile_error::GraphError;
use crate::graph::compiled::CompiledGraph;
use crate::graph::conditional::{ConditionalEdgeGroup, Router};
use crate::graph::edge::{Edge, EdgeKind};
use crate::graph::node::Node;
use crate::graph::placement::NodePlacement;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

fn is_reserved(name: &str) -> bool {
    name == START || name == END
}

pub struct GraphBuilder<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    name: String,
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<Edge>,
    conditional_edges: HashMap<String, Vec<ConditionalEdgeGroup<S>>>,
    entry_point: Option<String>,
    finish_point: Option<String>,
    metadata: HashMap<String, Value>,
    node_placements: HashMap<String, NodePlacement>,
    checkpointer: Option<Arc<dyn Checkpointer<S>>>,
}

impl<S> GraphBuilder<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            entry_point: None,
            finish_point: None,
            metadata: HashMap::new(),
            node_placements: HashMap::new(),
            checkpointer: None,
        }
    }

    /// Registers a node. Fails if `name` is `START`/`END` or already taken
    /// (spec §4.1 AddNode).
    pub fn add_node(&mut self, name: impl Into<String>, node: Arc<dyn Node<S>>) -> Result<&mut Self, GraphError> {
        let name = name.into();
        if is_reserved(&name) {
            return Err(GraphError::ReservedName(name));
        }
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        self.nodes.insert(name, node);
        Ok(self)
    }

    /// Adds a plain edge. Always additive; endpoint validation is deferred
    /// to `build`/`validate` (spec §4.1 AddEdge).
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Plain,
        });
        self
    }

    /// Adds a conditional edge group on `from`. Multiple groups may be
    /// attached; `label_map = None` means dynamic mode (spec §4.1).
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<String>,
        router: Router<S>,
        label_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .entry(from.into())
            .or_default()
            .push(ConditionalEdgeGroup::new(router, label_map));
        self
    }

    /// Expands a loop-back edge into a conditional edge group whose router
    /// counts visits and routes back to `source` while `predicate` holds and
    /// the visit counter is under `max_iterations` (spec §4.4).
    pub fn add_loop_back_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        predicate: Arc<dyn Fn(&S) -> bool + Send + Sync>,
        max_iterations: u64,
    ) -> &mut Self {
        let source = source.into();
        let target = target.into();
        let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let back_label = "__loop_back__".to_string();
        let continue_label = "__loop_continue__".to_string();
        let router: Router<S> = Arc::new(move |state: &S| {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if predicate(state) && n < max_iterations {
                back_label.clone()
            } else {
                continue_label.clone()
            }
        });
        let mut map = HashMap::new();
        map.insert("__loop_back__".to_string(), source.clone());
        map.insert("__loop_continue__".to_string(), target.clone());
        self.add_conditional_edge(source, router, Some(map))
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry_point = Some(name.into());
        self
    }

    pub fn set_finish_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.finish_point = Some(name.into());
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer<S>>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_node_placement(mut self, placement: NodePlacement) -> Self {
        self.node_placements.insert(placement.node_name.clone(), placement);
        self
    }

    pub fn with_node_placement_no_fallback(self, node_name: impl Into<String>, executor_name: impl Into<String>) -> Self {
        self.with_node_placement(NodePlacement::new(node_name, executor_name).no_fallback())
    }

    /// Validates the graph as it stands without consuming the builder.
    /// Grounded in the teacher's `compile_internal`, split into a standalone
    /// pass so callers can check a graph mid-construction.
    pub fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            if edge.from != START && !self.nodes.contains_key(&edge.from) {
                return Err(GraphError::NodeNotFound(edge.from.clone()));
            }
            if edge.to != END && !self.nodes.contains_key(&edge.to) {
                return Err(GraphError::NodeNotFound(edge.to.clone()));
            }
        }
        for (from, groups) in &self.conditional_edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::NodeNotFound(from.clone()));
            }
            for group in groups {
                if let Some(map) = &group.label_map {
                    for target in map.values() {
                        if target != END && !self.nodes.contains_key(target) {
                            return Err(GraphError::UnknownConditionalTarget {
                                from: from.clone(),
                                target: target.clone(),
                            });
                        }
                    }
                }
            }
        }
        if self.entry_point.is_none() {
            let has_start_edge = self.edges.iter().any(|e| e.from == START)
                || self.conditional_edges.contains_key(START);
            if !has_start_edge {
                return Err(GraphError::MissingEntryPoint);
            }
        }
        Ok(())
    }

    /// Builds the compiled, executable graph: injects the implicit
    /// `START`/`END` wiring then runs validation and derives the execution
    /// plan (spec §4.1 Build/Compile).
    pub fn build(self) -> Result<CompiledGraph<S>, GraphError> {
        self.validate()?;

        let entry_point = self
            .entry_point
            .clone()
            .or_else(|| self.edges.iter().find(|e| e.from == START).map(|e| e.to.clone()))
            .ok_or(GraphError::MissingEntryPoint)?;

        CompiledGraph::from_builder(self, entry_point)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        HashMap<String, Arc<dyn Node<S>>>,
        Vec<Edge>,
        HashMap<String, Vec<ConditionalEdgeGroup<S>>>,
        Option<String>,
        HashMap<String, Value>,
        HashMap<String, NodePlacement>,
        Option<Arc<dyn Checkpointer<S>>>,
    ) {
        (
            self.name,
            self.nodes,
            self.edges,
            self.conditional_edges,
            self.finish_point,
            self.metadata,
            self.node_placements,
            self.checkpointer,
        )
    }
}
