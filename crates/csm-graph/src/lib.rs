//! # csm-graph: Counterparty Proximity
//!
//! Measures how close an address sits to sanctioned activity: the hop
//! distance to the nearest designated address over a caller-supplied
//! counterparty graph, within a hard hop and node budget.
//!
//! - [`CounterpartyGraph`]: the adjacency seam. Callers implement it over
//!   whatever transaction window they hold.
//! - [`AdjacencyGraph`]: in-memory implementation built from transactions.
//! - [`resolve_proximity`]: bounded deterministic BFS.

pub mod adjacency;
pub mod proximity;

pub use adjacency::{AdjacencyGraph, CounterpartyGraph};
pub use proximity::{
    resolve_proximity, resolve_proximity_excluding, ProximityBounds, ProximityResult, MAX_HOPS_LIMIT,
};
