//! Task-graph execution.
//!
//! - [`graph`]: the graph itself, an arena of typed task nodes whose edges are the
//!   inputs each task declares
//! - [`executor`]: runs a graph on a bounded pool of blocking workers, fail-fast
//! - [`store`]: the write-once file store tasks use to hand files to each other
//!
//! The split workflow in [`crate::split`] is one graph built from these pieces.

pub mod executor;
pub mod graph;
pub mod store;
