//! State merger: combines the parallel outputs of one Pregel superstep into
//! a single canonical state.
//!
//! A small trait plus two ready implementations: last-writer-wins and a
//! deterministic node-order overwrite.

use std::fmt::Debug;

/// Combines the outputs of every node that ran in a superstep, in the order
/// they were scheduled, into one state to carry into the next step.
pub trait Merger<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// `outputs` is never empty: the superstep's active set was non-empty or
    /// the step wouldn't have run at all.
    fn merge(&self, outputs: Vec<(String, S)>) -> S;
}

/// The default, documented-as-weak merger: the last output in scheduling
/// order wins, silently discarding every other concurrent write. Per the
/// open design question, this default is never picked implicitly —
/// `PregelExecutor::new` requires an explicit merger; this type exists for
/// callers who accept the weakness via `PregelExecutor::with_last_write_wins`.
pub struct LastWriteWins;

impl<S> Merger<S> for LastWriteWins
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn merge(&self, outputs: Vec<(String, S)>) -> S {
        outputs
            .into_iter()
            .last()
            .map(|(_, s)| s)
            .expect("superstep outputs are never empty")
    }
}

/// Picks the output of whichever node sorts last by name, deterministic
/// regardless of scheduling/completion order (useful for tests that need a
/// merge outcome independent of task interleaving).
pub fn overwrite_by_node_order<S>(mut outputs: Vec<(String, S)>) -> S
where
    S: Clone + Send + Sync + Debug + 'static,
{
    outputs.sort_by(|a, b| a.0.cmp(&b.0));
    outputs.pop().map(|(_, s)| s).expect("superstep outputs are never empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_picks_final_output() {
        let merger = LastWriteWins;
        let result = merger.merge(vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]);
        assert_eq!(result, 3);
    }

    #[test]
    fn overwrite_by_node_order_is_deterministic() {
        let result = overwrite_by_node_order(vec![("b".into(), 2), ("a".into(), 1)]);
        assert_eq!(result, 1);
    }
}
