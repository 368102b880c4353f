//! # hexagon
//!
//! A graph-orchestration engine: build a typed directed graph of state
//! transforms, compile it, and run it either as a strict single-frontier
//! DAG or as a cyclic Pregel-style superstep scheduler. One shared state
//! type flows through every node — no separate input/output types.
//!
//! ## Design principles
//!
//! - **Single state type**: a graph is generic over one `S`, cloned and
//!   passed between nodes; node handlers read and return `S`.
//! - **Compile then run**: [`graph::GraphBuilder`] assembles nodes and
//!   edges declaratively; `build()` validates the graph and produces an
//!   immutable [`graph::CompiledGraph`], which [`executor::DagExecutor`] or
//!   [`executor::PregelExecutor`] actually drives.
//! - **Everything else is optional plumbing around that core**:
//!   checkpointing ([`checkpoint`]), human-in-the-loop pauses ([`hitl`]),
//!   a time-travel debugger ([`debugger`]), distributed node dispatch
//!   ([`distributed`]), and a uniform `Runnable` contract with resilience
//!   wrappers ([`runnable`]) for embedding nodes/tools/subgraphs elsewhere.
//!
//! ## Main modules
//!
//! - [`graph`]: `GraphBuilder`, `CompiledGraph`, `Node`, edges, execution
//!   plan — build and compile graphs.
//! - [`executor`]: `DagExecutor` (single frontier) and `PregelExecutor`
//!   (superstep scheduler with a pluggable `Merger`).
//! - [`loops`]: bounded loop primitives (`while`, `do_while`, `for_n`,
//!   `for_each`, `parallel_for_each`, `retry`) and the loop-back-edge
//!   machinery `GraphBuilder::add_loop_back_edge` compiles into.
//! - [`checkpoint`]: basic and enhanced checkpointers, savers, and
//!   `CheckpointRunner`.
//! - [`hitl`]: human-in-the-loop interrupts, handlers, and executor.
//! - [`debugger`]: time-travel snapshot recording, replay, and diffing.
//! - [`distributed`]: remote node dispatch with per-node fallback.
//! - [`runnable`]: the six-mode `Runnable` contract plus retry/fallback/
//!   circuit-breaker wrappers and `Promise`/`Future` async primitives.
//! - [`analysis`]: Mermaid/DOT/ASCII graph visualization.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hexagon::execution::ExecutionError;
//! use hexagon::executor::DagExecutor;
//! use hexagon::graph::{node_fn, GraphBuilder, END, START};
//! use hexagon::checkpoint::RunnableConfig;
//!
//! #[derive(Clone, Debug, Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut builder = GraphBuilder::<Counter>::new("counter");
//! builder
//!     .add_node("increment", node_fn("increment", |mut s: Counter| async move {
//!         s.value += 1;
//!         Ok::<_, ExecutionError>(s)
//!     }))
//!     .unwrap();
//! builder.add_edge(START, "increment");
//! builder.add_edge("increment", END);
//! let graph = builder.build().unwrap();
//!
//! let executor = DagExecutor::new(graph);
//! let outcome = executor.invoke(Counter::default(), RunnableConfig::default()).await.unwrap();
//! assert_eq!(outcome.into_state().value, 1);
//! # }
//! ```

pub mod analysis;
pub mod checkpoint;
pub mod debugger;
pub mod distributed;
pub mod error;
pub mod execution;
pub mod executor;
pub mod graph;
pub mod hitl;
pub mod loops;
pub mod runnable;
pub mod state;
pub mod stream;
pub mod telemetry;

pub use error::HexagonError;
pub use state::{content_hash, SerializableState, State};
