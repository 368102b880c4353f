//! Execution plan derived at compile time: topological order, parallel
//! groups (by longest-path level), critical path, and per-node dependency
//! sets (spec §4.1 step 4, §4.10).
//!
//! Analysis runs over a *static* adjacency: plain edges plus every
//! statically-known conditional-edge target (the values of a label map;
//! dynamic-mode groups contribute no static edges since their target is
//! only known at routing time). Graphs with loop-back edges or Pregel
//! cycles are not acyclic, so topological order / levels are best-effort:
//! nodes left over after Kahn's algorithm runs out of zero-in-degree nodes
//! are appended in declaration order rather than causing a hard error —
//! callers doing static analysis on a cyclic graph already know it's
//! cyclic, this is for visualization and statistics, not routing.

use std::collections::{HashMap, HashSet, VecDeque};

use super::{EdgeKind, END, START};

#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub topological_order: Vec<String>,
    /// Nodes grouped by longest-path level from the entry point; nodes in
    /// the same group have no dependency on one another and could run
    /// concurrently.
    pub parallel_groups: Vec<Vec<String>>,
    /// One path achieving the maximum level, from entry point to END.
    pub critical_path: Vec<String>,
    /// node -> set of nodes with an edge into it.
    pub dependencies: HashMap<String, HashSet<String>>,
}

pub fn build_plan(
    node_names: &[String],
    static_adjacency: &HashMap<String, Vec<String>>,
    entry_point: &str,
) -> ExecutionPlan {
    let mut in_degree: HashMap<String, usize> = node_names.iter().map(|n| (n.clone(), 0)).collect();
    in_degree.entry(END.to_string()).or_insert(0);
    let mut dependencies: HashMap<String, HashSet<String>> = HashMap::new();

    for (from, tos) in static_adjacency {
        for to in tos {
            *in_degree.entry(to.clone()).or_insert(0) += 1;
            dependencies.entry(to.clone()).or_default().insert(from.clone());
        }
    }

    // Kahn's algorithm for topological order, seeded at the entry point so
    // unreachable nodes still appear (after the reachable prefix).
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut seen_zero = HashSet::new();
    if in_degree.get(entry_point).copied().unwrap_or(0) == 0 {
        queue.push_back(entry_point.to_string());
        seen_zero.insert(entry_point.to_string());
    }
    for name in node_names {
        if name != entry_point && in_degree.get(name).copied().unwrap_or(0) == 0 && !seen_zero.contains(name) {
            queue.push_back(name.clone());
            seen_zero.insert(name.clone());
        }
    }

    let mut remaining = in_degree.clone();
    let mut topo = Vec::new();
    let mut levels: HashMap<String, usize> = HashMap::new();
    levels.insert(entry_point.to_string(), 0);

    while let Some(node) = queue.pop_front() {
        topo.push(node.clone());
        let level = *levels.get(&node).unwrap_or(&0);
        if let Some(tos) = static_adjacency.get(&node) {
            for to in tos {
                let next_level = levels.get(to).copied().unwrap_or(0).max(level + 1);
                levels.insert(to.clone(), next_level);
                if let Some(d) = remaining.get_mut(to) {
                    if *d > 0 {
                        *d -= 1;
                        if *d == 0 {
                            queue.push_back(to.clone());
                        }
                    }
                }
            }
        }
    }

    // Cyclic leftovers: append anything not yet visited, in declaration order.
    for name in node_names.iter().chain(std::iter::once(&END.to_string())) {
        if !topo.contains(name) {
            topo.push(name.clone());
        }
    }

    let max_level = levels.values().copied().max().unwrap_or(0);
    let mut parallel_groups: Vec<Vec<String>> = vec![Vec::new(); max_level + 1];
    for (name, level) in &levels {
        parallel_groups[*level].push(name.clone());
    }
    for group in &mut parallel_groups {
        group.sort();
    }
    parallel_groups.retain(|g| !g.is_empty());

    let critical_path = trace_critical_path(&levels, static_adjacency, entry_point, max_level);

    ExecutionPlan {
        topological_order: topo,
        parallel_groups,
        critical_path,
        dependencies,
    }
}

fn trace_critical_path(
    levels: &HashMap<String, usize>,
    adjacency: &HashMap<String, Vec<String>>,
    entry_point: &str,
    max_level: usize,
) -> Vec<String> {
    let mut path = vec![entry_point.to_string()];
    let mut current = entry_point.to_string();
    let mut current_level = 0usize;
    while current_level < max_level {
        let next = adjacency
            .get(&current)
            .into_iter()
            .flatten()
            .max_by_key(|n| levels.get(*n).copied().unwrap_or(0));
        match next {
            Some(n) => {
                current_level = levels.get(n).copied().unwrap_or(current_level);
                current = n.clone();
                path.push(current.clone());
            }
            None => break,
        }
    }
    path
}

/// Builds the static adjacency used for analysis: plain edges plus every
/// statically-known conditional target.
pub fn static_adjacency_from_edges(
    edges: &[super::Edge],
    conditional_targets: &HashMap<String, Vec<String>>,
) -> HashMap<String, Vec<String>> {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    for edge in edges {
        if matches!(edge.kind, EdgeKind::Plain) && edge.from != START {
            adjacency.entry(edge.from.clone()).or_default().push(edge.to.clone());
        }
    }
    for (from, targets) in conditional_targets {
        adjacency.entry(from.clone()).or_default().extend(targets.iter().cloned());
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_plan_orders_and_groups_by_level() {
        let mut adjacency = HashMap::new();
        adjacency.insert("a".to_string(), vec!["b".to_string()]);
        adjacency.insert("b".to_string(), vec!["c".to_string()]);
        let plan = build_plan(
            &["a".to_string(), "b".to_string(), "c".to_string()],
            &adjacency,
            "a",
        );
        assert_eq!(plan.topological_order[0], "a");
        assert!(plan.parallel_groups.iter().any(|g| g == &vec!["a".to_string()]));
        assert_eq!(plan.critical_path.first(), Some(&"a".to_string()));
    }

    #[test]
    fn fan_out_groups_siblings_at_same_level() {
        let mut adjacency = HashMap::new();
        adjacency.insert("a".to_string(), vec!["b".to_string(), "c".to_string()]);
        let plan = build_plan(
            &["a".to_string(), "b".to_string(), "c".to_string()],
            &adjacency,
            "a",
        );
        let sibling_group = plan
            .parallel_groups
            .iter()
            .find(|g| g.contains(&"b".to_string()))
            .unwrap();
        assert!(sibling_group.contains(&"c".to_string()));
    }
}
