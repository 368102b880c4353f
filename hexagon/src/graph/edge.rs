//! Edges: directed connections between nodes (spec §3 Edge).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Plain,
    Conditional,
    LoopBack,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn plain(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Plain,
        }
    }
}
