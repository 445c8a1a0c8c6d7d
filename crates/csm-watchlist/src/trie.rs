//! Byte trie over normalized addresses with bounded edit-distance search.
//!
//! The search walks the trie carrying one Levenshtein DP row per node and
//! abandons a branch as soon as every cell in its row exceeds the bound, so
//! cost grows with the number of prefixes within the bound rather than with
//! the size of the list.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<u8, usize>,
    value: Option<usize>,
}

/// Maps address strings to caller-defined value slots.
#[derive(Debug)]
pub(crate) struct AddressTrie {
    nodes: Vec<Node>,
}

impl AddressTrie {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Insert `key`; returns the previous value slot if the key was present.
    pub(crate) fn insert(&mut self, key: &str, value: usize) -> Option<usize> {
        let mut node = 0;
        for byte in key.bytes() {
            node = match self.nodes[node].children.get(&byte) {
                Some(&child) => child,
                None => {
                    self.nodes.push(Node::default());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children.insert(byte, child);
                    child
                }
            };
        }
        self.nodes[node].value.replace(value)
    }

    /// Every stored key within `max` edits of `query`, as (value, distance).
    ///
    /// Results come out in key byte order.
    pub(crate) fn within_distance(&self, query: &str, max: usize) -> Vec<(usize, usize)> {
        let query = query.as_bytes();
        let first_row: Vec<usize> = (0..=query.len()).collect();
        let mut hits = Vec::new();
        if let Some(value) = self.nodes[0].value {
            if query.len() <= max {
                hits.push((value, query.len()));
            }
        }
        for (&byte, &child) in &self.nodes[0].children {
            self.walk(child, byte, query, &first_row, max, &mut hits);
        }
        hits
    }

    fn walk(
        &self,
        node: usize,
        byte: u8,
        query: &[u8],
        prev: &[usize],
        max: usize,
        hits: &mut Vec<(usize, usize)>,
    ) {
        let mut row = Vec::with_capacity(prev.len());
        row.push(prev[0] + 1);
        for i in 1..=query.len() {
            let insertion = row[i - 1] + 1;
            let deletion = prev[i] + 1;
            let substitution = prev[i - 1] + usize::from(query[i - 1] != byte);
            row.push(insertion.min(deletion).min(substitution));
        }

        let distance = row[query.len()];
        if distance <= max {
            if let Some(value) = self.nodes[node].value {
                hits.push((value, distance));
            }
        }
        if row.iter().copied().min().unwrap_or(usize::MAX) <= max {
            for (&next, &child) in &self.nodes[node].children {
                self.walk(child, next, query, &row, max, hits);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.value.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levenshtein(a: &[u8], b: &[u8]) -> usize {
        let mut prev: Vec<usize> = (0..=b.len()).collect();
        for (i, &ca) in a.iter().enumerate() {
            let mut row = vec![i + 1];
            for (j, &cb) in b.iter().enumerate() {
                let v = (row[j] + 1).min(prev[j + 1] + 1).min(prev[j] + usize::from(ca != cb));
                row.push(v);
            }
            prev = row;
        }
        prev[b.len()]
    }

    fn trie_of(keys: &[&str]) -> AddressTrie {
        let mut trie = AddressTrie::new();
        for (i, key) in keys.iter().enumerate() {
            trie.insert(key, i);
        }
        trie
    }

    #[test]
    fn test_exact_and_single_edits() {
        let trie = trie_of(&["0xabc", "0xabd", "0xzzz"]);
        let mut hits = trie.within_distance("0xabc", 1);
        hits.sort();
        assert_eq!(hits, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_insertion_and_deletion() {
        let trie = trie_of(&["abcd"]);
        assert_eq!(trie.within_distance("abd", 1), vec![(0, 1)]);
        assert_eq!(trie.within_distance("abxcd", 1), vec![(0, 1)]);
        assert!(trie.within_distance("ab", 1).is_empty());
    }

    #[test]
    fn test_zero_bound_is_exact() {
        let trie = trie_of(&["abc", "abd"]);
        assert_eq!(trie.within_distance("abd", 0), vec![(1, 0)]);
    }

    #[test]
    fn test_reinsert_replaces_value() {
        let mut trie = AddressTrie::new();
        assert_eq!(trie.insert("k", 1), None);
        assert_eq!(trie.insert("k", 2), Some(1));
        assert_eq!(trie.len(), 1);
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            keys in proptest::collection::btree_set("[ab]{1,6}", 1..12),
            query in "[ab]{0,7}",
            max in 0usize..=2,
        ) {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let trie = trie_of(&keys);
            let mut got = trie.within_distance(&query, max);
            got.sort();
            let mut expected: Vec<(usize, usize)> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (i, levenshtein(k.as_bytes(), query.as_bytes())))
                .filter(|(_, d)| *d <= max)
                .collect();
            expected.sort();
            prop_assert_eq!(got, expected);
        }
    }
}
