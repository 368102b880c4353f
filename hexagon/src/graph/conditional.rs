//! Conditional edge groups: a router plus optional label→target mapping
//! attached to a source node (spec §3 "Conditional edge group").
//!
//! Multiple groups may be attached to the same source; `resolve` tries them
//! in attachment order and the first whose router produces a *known* label
//! wins — known meaning either a hit in the group's label map, or any label
//! at all when the group has no map (dynamic mode: the router's return
//! value *is* the target name, spec §4.1 / §9).

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A pure function from state to a routing label. Kept synchronous per spec
/// §3 ("pure function `S → label`") — routers never do I/O.
pub type Router<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ConditionalEdgeGroup<S> {
    pub router: Router<S>,
    /// `None` means dynamic mode: the router's output is the literal target.
    pub label_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalEdgeGroup<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(router: Router<S>, label_map: Option<HashMap<String, String>>) -> Self {
        Self { router, label_map }
    }

    /// Evaluates this group's router against `state`. Returns the resolved
    /// target node name, or `None` if the group has a label map and the
    /// router's label isn't in it (caller should try the next group).
    pub fn resolve(&self, state: &S) -> Option<String> {
        let label = (self.router)(state);
        match &self.label_map {
            Some(map) => map.get(&label).cloned(),
            None => Some(label),
        }
    }
}

/// Tries each group in order; the first to resolve wins. Returns `None` if
/// no group in `groups` resolves (caller falls back to the plain edge).
pub fn resolve_conditional<S>(groups: &[ConditionalEdgeGroup<S>], state: &S) -> Option<String>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    for group in groups {
        if let Some(target) = group.resolve(state) {
            return Some(target);
        }
    }
    None
}
