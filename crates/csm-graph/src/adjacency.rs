//! Counterparty adjacency views.
//!
//! The resolver never fetches chain data itself. Callers hand it a
//! [`CounterpartyGraph`] covering whatever window of recent activity they
//! have; [`AdjacencyGraph`] is the in-memory implementation, usually built
//! from a batch of transactions.

use std::collections::{BTreeSet, HashMap};

use csm_core::{normalize, NormalizedAddress, Transaction};

/// Read access to direct counterparties of an address.
pub trait CounterpartyGraph {
    /// Addresses that transacted directly with `address`. Order and
    /// duplicates do not matter; the resolver sorts and deduplicates.
    fn counterparties(&self, address: &NormalizedAddress) -> Vec<NormalizedAddress>;
}

/// Undirected in-memory adjacency view.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    edges: HashMap<NormalizedAddress, BTreeSet<NormalizedAddress>>,
}

impl AdjacencyGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link two addresses in both directions. Self-loops are ignored.
    pub fn add_edge(&mut self, a: NormalizedAddress, b: NormalizedAddress) {
        if a == b {
            return;
        }
        self.edges.entry(a.clone()).or_default().insert(b.clone());
        self.edges.entry(b).or_default().insert(a);
    }

    /// Build from every sender/receiver pairing in `transactions`.
    ///
    /// Participants that fail normalization contribute no edges.
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut graph = Self::new();
        for tx in transactions {
            graph.extend_from_transaction(tx);
        }
        graph
    }

    /// Add the sender/receiver pairings of one transaction.
    pub fn extend_from_transaction(&mut self, tx: &Transaction) {
        for (sender, receiver) in tx.counterparty_pairs() {
            match (normalize(tx.chain, sender), normalize(tx.chain, receiver)) {
                (Ok(s), Ok(r)) => self.add_edge(s, r),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::debug!(tx = %tx.hash, error = %e, "skipping counterparty edge");
                }
            }
        }
    }

    /// Number of addresses with at least one edge.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

impl CounterpartyGraph for AdjacencyGraph {
    fn counterparties(&self, address: &NormalizedAddress) -> Vec<NormalizedAddress> {
        self.edges
            .get(address)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csm_core::ChainFamily;

    fn tx(participants: &str) -> Transaction {
        serde_json::from_str(&format!(
            r#"{{"chain":"ethereum","hash":"0x01","timestamp":"2026-01-15T12:00:00Z",
                "participants":{participants},"amount":"1","asset":"ETH"}}"#
        ))
        .unwrap()
    }

    fn evm(n: u32) -> String {
        format!("0x{n:040x}")
    }

    #[test]
    fn test_edges_are_undirected() {
        let mut graph = AdjacencyGraph::new();
        let a = normalize(ChainFamily::Ethereum, &evm(1)).unwrap();
        let b = normalize(ChainFamily::Ethereum, &evm(2)).unwrap();
        graph.add_edge(a.clone(), b.clone());
        graph.add_edge(a.clone(), a.clone());
        assert_eq!(graph.counterparties(&a), vec![b.clone()]);
        assert_eq!(graph.counterparties(&b), vec![a]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_from_transactions_skips_malformed() {
        let participants = format!(
            r#"[{{"address":"{}","role":"sender"}},{{"address":"{}","role":"receiver"}},{{"address":"0xbad","role":"receiver"}}]"#,
            evm(1),
            evm(2)
        );
        let graph = AdjacencyGraph::from_transactions([&tx(&participants)]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
