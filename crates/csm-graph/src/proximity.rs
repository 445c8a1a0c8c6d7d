//! # Proximity Resolver
//!
//! Finds how many counterparty hops separate an address from the nearest
//! designated address.
//!
//! ## Algorithm
//!
//! Breadth-first search from the query address over a
//! [`CounterpartyGraph`]. At each node, counterparties are visited in
//! lexicographic order of their normalized form, and the first designated
//! address discovered is reported. BFS order makes that address the fewest
//! hops away; the fixed visiting order makes the choice among equidistant
//! ones reproducible.
//!
//! ## Bounds
//!
//! - `max_hops` limits depth (clamped to [`MAX_HOPS_LIMIT`]).
//! - `max_nodes` limits how many distinct addresses may be discovered,
//!   including the source. High fan-out nodes such as mixers exhaust it
//!   quickly; an exhausted budget yields no result.
//!
//! ## Excluded addresses
//!
//! [`resolve_proximity_excluding`] takes a set of designated addresses that
//! the caller has already accounted for. They are traversed like any other
//! address but never reported, so a second designated address behind or
//! beside them is still found.
//!
//! The result only describes the caller's adjacency window. It is a
//! heuristic, not a claim about the full chain graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use csm_core::NormalizedAddress;
use csm_watchlist::{SanctionsEntry, WatchlistIndex};

use crate::adjacency::CounterpartyGraph;

/// Hard ceiling on traversal depth.
pub const MAX_HOPS_LIMIT: u8 = 6;

/// Traversal budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityBounds {
    /// Maximum hop distance explored.
    pub max_hops: u8,
    /// Maximum number of distinct addresses discovered.
    pub max_nodes: usize,
}

impl Default for ProximityBounds {
    fn default() -> Self {
        Self {
            max_hops: 2,
            max_nodes: 10_000,
        }
    }
}

/// Nearest designated address found within the bounds.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityResult {
    /// The query address.
    pub source: NormalizedAddress,
    /// The designated address reached.
    pub nearest_designated: NormalizedAddress,
    /// Its owning entry.
    pub entry: Arc<SanctionsEntry>,
    /// Hops from source; 0 when the source itself is designated.
    pub hop_distance: u8,
    /// Addresses from source to designated address, both included.
    pub path: Vec<NormalizedAddress>,
}

/// Resolve the nearest designated address to `source` within `bounds`.
pub fn resolve_proximity<G>(
    source: &NormalizedAddress,
    bounds: &ProximityBounds,
    graph: &G,
    index: &WatchlistIndex,
) -> Option<ProximityResult>
where
    G: CounterpartyGraph + ?Sized,
{
    resolve_proximity_excluding(source, bounds, graph, index, &HashSet::new())
}

/// Like [`resolve_proximity`], but designated addresses in `excluded` are
/// passed through instead of reported.
pub fn resolve_proximity_excluding<G>(
    source: &NormalizedAddress,
    bounds: &ProximityBounds,
    graph: &G,
    index: &WatchlistIndex,
    excluded: &HashSet<NormalizedAddress>,
) -> Option<ProximityResult>
where
    G: CounterpartyGraph + ?Sized,
{
    if let Some(entry) = designated(index, excluded, source) {
        return Some(ProximityResult {
            source: source.clone(),
            nearest_designated: source.clone(),
            entry: Arc::clone(entry),
            hop_distance: 0,
            path: vec![source.clone()],
        });
    }

    let max_hops = bounds.max_hops.min(MAX_HOPS_LIMIT);
    let mut previous: HashMap<NormalizedAddress, NormalizedAddress> = HashMap::new();
    let mut visited: HashSet<NormalizedAddress> = HashSet::from([source.clone()]);
    let mut frontier: VecDeque<(NormalizedAddress, u8)> = VecDeque::from([(source.clone(), 0)]);

    while let Some((current, depth)) = frontier.pop_front() {
        if depth >= max_hops {
            break;
        }
        let mut neighbors = graph.counterparties(&current);
        neighbors.sort();
        neighbors.dedup();

        for next in neighbors {
            if visited.contains(&next) {
                continue;
            }
            if visited.len() >= bounds.max_nodes {
                tracing::debug!(
                    source = %source,
                    max_nodes = bounds.max_nodes,
                    depth,
                    "proximity node budget exhausted"
                );
                return None;
            }
            visited.insert(next.clone());
            previous.insert(next.clone(), current.clone());

            if let Some(entry) = designated(index, excluded, &next) {
                let path = reconstruct_path(source, &next, &previous);
                return Some(ProximityResult {
                    source: source.clone(),
                    nearest_designated: next,
                    entry: Arc::clone(entry),
                    hop_distance: depth + 1,
                    path,
                });
            }
            frontier.push_back((next, depth + 1));
        }
    }
    None
}

fn designated<'i>(
    index: &'i WatchlistIndex,
    excluded: &HashSet<NormalizedAddress>,
    address: &NormalizedAddress,
) -> Option<&'i Arc<SanctionsEntry>> {
    if excluded.contains(address) {
        return None;
    }
    index.lookup_exact(address)
}

fn reconstruct_path(
    source: &NormalizedAddress,
    target: &NormalizedAddress,
    previous: &HashMap<NormalizedAddress, NormalizedAddress>,
) -> Vec<NormalizedAddress> {
    let mut path = vec![target.clone()];
    let mut current = target;
    while let Some(prev) = previous.get(current) {
        path.push(prev.clone());
        if prev == source {
            break;
        }
        current = prev;
    }
    path.reverse();
    path
}
