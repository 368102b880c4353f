//! Human-readable renderings of a compiled graph (spec §4.10): Mermaid,
//! Graphviz DOT, and a plain-ASCII listing. IDs are sanitized for each
//! target syntax; the reserved `START`/`END` sentinels map to explicit
//! pseudo-ids rather than being sanitized literally (`__start__` would
//! otherwise collide with a user node minus its underscores).

use std::collections::HashSet;
use std::fmt::Debug;

use crate::graph::{CompiledGraph, EdgeKind, END, START};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopDown,
    LeftRight,
    BottomUp,
    RightLeft,
}

impl Direction {
    fn mermaid_code(self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
            Direction::BottomUp => "BT",
            Direction::RightLeft => "RL",
        }
    }

    fn dot_rankdir(self) -> &'static str {
        match self {
            Direction::TopDown => "TB",
            Direction::LeftRight => "LR",
            Direction::BottomUp => "BT",
            Direction::RightLeft => "RL",
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::TopDown
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisualizeOptions {
    pub direction: Direction,
    /// Node names to render with distinct highlight styling.
    pub highlight: HashSet<String>,
}

impl VisualizeOptions {
    pub fn with_highlight(mut self, nodes: impl IntoIterator<Item = String>) -> Self {
        self.highlight.extend(nodes);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Replaces characters that break Mermaid/DOT identifier syntax (spaces,
/// hyphens, dots, slashes) with underscores; maps the reserved sentinels to
/// explicit pseudo-ids so they never collide with a sanitized user node.
fn sanitize_id(name: &str) -> String {
    if name == START {
        return "__START__".to_string();
    }
    if name == END {
        return "__END__".to_string();
    }
    name.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

fn escape_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

pub fn to_mermaid<S>(graph: &CompiledGraph<S>, options: &VisualizeOptions) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut out = format!("flowchart {}\n", options.direction.mermaid_code());
    out.push_str(&format!("    {}([START])\n", sanitize_id(START)));
    out.push_str(&format!("    {}([END])\n", sanitize_id(END)));

    for name in graph.nodes().keys() {
        let id = sanitize_id(name);
        if options.highlight.contains(name) {
            out.push_str(&format!("    {id}[\"{}\"]:::highlight\n", escape_label(name)));
        } else {
            out.push_str(&format!("    {id}[\"{}\"]\n", escape_label(name)));
        }
    }

    for edge in graph.edges() {
        if edge.kind == EdgeKind::Plain {
            out.push_str(&format!("    {} --> {}\n", sanitize_id(&edge.from), sanitize_id(&edge.to)));
        }
    }

    for (from, groups) in all_conditional_edges(graph) {
        for group in groups {
            let Some(label_map) = &group.label_map else { continue };
            for (label, target) in label_map {
                out.push_str(&format!("    {} -->|{}| {}\n", sanitize_id(from), escape_label(label), sanitize_id(target)));
            }
        }
    }

    if !options.highlight.is_empty() {
        out.push_str("    classDef highlight fill:#f96,stroke:#333,stroke-width:2px;\n");
    }
    out
}

pub fn to_dot<S>(graph: &CompiledGraph<S>, options: &VisualizeOptions) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut out = format!("digraph {} {{\n", sanitize_id(graph.name()));
    out.push_str(&format!("    rankdir={};\n", options.direction.dot_rankdir()));
    out.push_str(&format!("    {} [label=\"START\", shape=circle, style=filled, fillcolor=lightgray];\n", sanitize_id(START)));
    out.push_str(&format!("    {} [label=\"END\", shape=doublecircle, style=filled, fillcolor=lightgray];\n", sanitize_id(END)));

    for name in graph.nodes().keys() {
        let id = sanitize_id(name);
        if options.highlight.contains(name) {
            out.push_str(&format!("    {id} [label=\"{}\", style=filled, fillcolor=orange];\n", escape_label(name)));
        } else {
            out.push_str(&format!("    {id} [label=\"{}\"];\n", escape_label(name)));
        }
    }

    for edge in graph.edges() {
        if edge.kind == EdgeKind::Plain {
            out.push_str(&format!("    {} -> {};\n", sanitize_id(&edge.from), sanitize_id(&edge.to)));
        }
    }

    for (from, groups) in all_conditional_edges(graph) {
        for group in groups {
            let Some(label_map) = &group.label_map else { continue };
            for (label, target) in label_map {
                out.push_str(&format!("    {} -> {} [label=\"{}\"];\n", sanitize_id(from), sanitize_id(target), escape_label(label)));
            }
        }
    }

    out.push_str("}\n");
    out
}

/// Plain-text rendering using the compiled execution plan's topological
/// order and parallel groupings.
pub fn to_ascii<S>(graph: &CompiledGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let plan = graph.plan();
    let mut out = format!("graph: {}\n", graph.name());
    out.push_str(&format!("entry: {}\n", graph.entry_point()));
    out.push_str("parallel groups (by level):\n");
    for (level, group) in plan.parallel_groups.iter().enumerate() {
        out.push_str(&format!("  [{level}] {}\n", group.join(", ")));
    }
    out.push_str(&format!("critical path: {}\n", plan.critical_path.join(" -> ")));
    out
}

fn all_conditional_edges<S>(graph: &CompiledGraph<S>) -> Vec<(&str, &[crate::graph::ConditionalEdgeGroup<S>])>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    graph.nodes().keys().filter_map(|name| graph.conditional_edges_for(name).map(|groups| (name.as_str(), groups))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{node_fn, GraphBuilder};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sample_graph() -> CompiledGraph<i32> {
        let mut b = GraphBuilder::<i32>::new("sample graph");
        b.add_node("check", node_fn("check", |s: i32| async move { Ok(s) })).unwrap();
        b.add_node("high", node_fn("high", |s: i32| async move { Ok(s) })).unwrap();
        b.add_node("low", node_fn("low", |s: i32| async move { Ok(s) })).unwrap();
        b.add_edge(START, "check");
        let mut label_map = HashMap::new();
        label_map.insert("high".to_string(), "high".to_string());
        label_map.insert("low".to_string(), "low".to_string());
        let router: Arc<dyn Fn(&i32) -> String + Send + Sync> = Arc::new(|s: &i32| if *s > 5 { "high".to_string() } else { "low".to_string() });
        b.add_conditional_edge("check", router, Some(label_map));
        b.add_edge("high", END);
        b.add_edge("low", END);
        b.build().unwrap()
    }

    #[test]
    fn mermaid_sanitizes_reserved_sentinels_and_includes_conditional_labels() {
        let graph = sample_graph();
        let mermaid = to_mermaid(&graph, &VisualizeOptions::default());
        assert!(mermaid.contains("__START__"));
        assert!(mermaid.contains("__END__"));
        assert!(mermaid.contains("-->|high|"));
        assert!(mermaid.contains("-->|low|"));
    }

    #[test]
    fn dot_marks_start_and_end_with_distinct_shapes() {
        let graph = sample_graph();
        let dot = to_dot(&graph, &VisualizeOptions::default());
        assert!(dot.contains("shape=circle"));
        assert!(dot.contains("shape=doublecircle"));
    }

    #[test]
    fn highlighted_nodes_get_distinct_styling() {
        let graph = sample_graph();
        let options = VisualizeOptions::default().with_highlight(["high".to_string()]);
        let mermaid = to_mermaid(&graph, &options);
        assert!(mermaid.contains(":::highlight"));
    }

    #[test]
    fn ascii_rendering_lists_parallel_groups_and_critical_path() {
        let graph = sample_graph();
        let ascii = to_ascii(&graph);
        assert!(ascii.contains("parallel groups"));
        assert!(ascii.contains("critical path"));
    }
}
