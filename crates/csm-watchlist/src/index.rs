//! # Watchlist Index
//!
//! An immutable, versioned index over one sanctions list.
//!
//! ## Design
//!
//! Per chain family the index keeps two structures over the same keys:
//!
//! - a hash map from normalized address to owning entry (exact lookup);
//! - an [`AddressTrie`] for bounded edit-distance queries, which catch
//!   single-character typos and homoglyph substitutions.
//!
//! Near-lookup distances are capped at [`MAX_NEAR_DISTANCE`]; a larger
//! request is clamped, never explored.
//!
//! The index is never mutated after [`WatchlistIndex::build`]. A list refresh
//! builds a new index and publishes it through
//! [`WatchlistStore`](crate::WatchlistStore).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use csm_core::{ChainFamily, NormalizedAddress, Timestamp, WatchlistVersion};

use crate::entry::{EntityType, SanctionsEntry};
use crate::trie::AddressTrie;

/// Hard ceiling on near-match edit distance.
pub const MAX_NEAR_DISTANCE: u8 = 2;

/// A near-lookup hit.
#[derive(Debug, Clone, Serialize)]
pub struct NearHit {
    /// Owning entry of the designated address.
    pub entry: Arc<SanctionsEntry>,
    /// The designated address that was within range.
    pub address: NormalizedAddress,
    /// Edit distance from the query.
    pub distance: u8,
}

#[derive(Debug)]
struct ChainIndex {
    exact: HashMap<String, usize>,
    trie: AddressTrie,
    /// Trie value slot → (address, entry index).
    slots: Vec<(NormalizedAddress, usize)>,
}

impl ChainIndex {
    fn new() -> Self {
        Self {
            exact: HashMap::new(),
            trie: AddressTrie::new(),
            slots: Vec::new(),
        }
    }
}

/// Summary counts for one index, for operators and the `stats` command.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistStats {
    /// List version.
    pub version: WatchlistVersion,
    /// When the index was built.
    pub built_at: Timestamp,
    /// Content fingerprint.
    pub fingerprint: String,
    /// Number of entries.
    pub entries: usize,
    /// Number of indexed addresses.
    pub addresses: usize,
    /// Addresses per chain family.
    pub addresses_by_chain: BTreeMap<ChainFamily, usize>,
    /// Entries per sanctions program.
    pub entries_by_program: BTreeMap<String, usize>,
    /// Entries per entity type.
    pub entries_by_type: BTreeMap<EntityType, usize>,
    /// Entries linked to the IRGC.
    pub irgc_linked: usize,
    /// Entries that are exchanges.
    pub exchanges: usize,
}

/// Immutable index over one sanctions list version.
#[derive(Debug)]
pub struct WatchlistIndex {
    version: WatchlistVersion,
    built_at: Timestamp,
    fingerprint: String,
    entries: Vec<Arc<SanctionsEntry>>,
    chains: HashMap<ChainFamily, ChainIndex>,
}

impl WatchlistIndex {
    /// Build an index over `entries`.
    ///
    /// If two entries claim the same normalized address, the first keeps it
    /// and the conflict is logged. [`ingest`](crate::ingest) already enforces
    /// this, so it only triggers for hand-assembled entry sets.
    pub fn build(version: WatchlistVersion, entries: Vec<SanctionsEntry>) -> Self {
        let entries: Vec<Arc<SanctionsEntry>> = entries.into_iter().map(Arc::new).collect();
        let mut chains: HashMap<ChainFamily, ChainIndex> = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            for record in &entry.addresses {
                let chain = chains.entry(record.chain()).or_insert_with(ChainIndex::new);
                let key = record.normalized.as_str();
                if let Some(&owner) = chain.exact.get(key) {
                    tracing::warn!(
                        address = %key,
                        owner = %entries[owner].entry_id,
                        claimant = %entry.entry_id,
                        "address claimed by two entries; keeping first"
                    );
                    continue;
                }
                chain.exact.insert(key.to_string(), idx);
                chain.trie.insert(key, chain.slots.len());
                chain.slots.push((record.normalized.clone(), idx));
            }
        }

        let fingerprint = fingerprint(&chains, &entries);
        let index = Self {
            version,
            built_at: Timestamp::now(),
            fingerprint,
            entries,
            chains,
        };
        tracing::info!(
            version = %index.version,
            entries = index.entries.len(),
            addresses = index.address_count(),
            fingerprint = %index.fingerprint,
            "watchlist index built"
        );
        index
    }

    /// List version this index was built from.
    pub fn version(&self) -> &WatchlistVersion {
        &self.version
    }

    /// Content fingerprint: SHA-256 over the sorted (chain, address, entry)
    /// triples, hex encoded. Independent of build time and input order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// All entries, in build order.
    pub fn entries(&self) -> &[Arc<SanctionsEntry>] {
        &self.entries
    }

    /// Number of indexed addresses across all chains.
    pub fn address_count(&self) -> usize {
        self.chains.values().map(|c| c.trie.len()).sum()
    }

    /// Entry owning exactly this address, if any.
    pub fn lookup_exact(&self, address: &NormalizedAddress) -> Option<&Arc<SanctionsEntry>> {
        let chain = self.chains.get(&address.chain())?;
        chain
            .exact
            .get(address.as_str())
            .map(|&idx| &self.entries[idx])
    }

    /// Designated addresses within `max_distance` edits of `address` on the
    /// same chain, ordered by distance then address.
    ///
    /// `max_distance` is clamped to [`MAX_NEAR_DISTANCE`].
    pub fn lookup_near(&self, address: &NormalizedAddress, max_distance: u8) -> Vec<NearHit> {
        let Some(chain) = self.chains.get(&address.chain()) else {
            return Vec::new();
        };
        let bound = max_distance.min(MAX_NEAR_DISTANCE);
        let mut hits: Vec<NearHit> = chain
            .trie
            .within_distance(address.as_str(), usize::from(bound))
            .into_iter()
            .map(|(slot, distance)| {
                let (designated, idx) = &chain.slots[slot];
                NearHit {
                    entry: Arc::clone(&self.entries[*idx]),
                    address: designated.clone(),
                    // bounded by MAX_NEAR_DISTANCE
                    distance: distance as u8,
                }
            })
            .collect();
        hits.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.address.cmp(&b.address)));
        hits
    }

    /// Summary counts.
    pub fn stats(&self) -> WatchlistStats {
        let mut entries_by_program = BTreeMap::new();
        let mut entries_by_type = BTreeMap::new();
        for entry in &self.entries {
            for program in entry.programs() {
                *entries_by_program.entry(program.to_string()).or_insert(0) += 1;
            }
            *entries_by_type.entry(entry.entity_type).or_insert(0) += 1;
        }
        WatchlistStats {
            version: self.version.clone(),
            built_at: self.built_at,
            fingerprint: self.fingerprint.clone(),
            entries: self.entries.len(),
            addresses: self.address_count(),
            addresses_by_chain: self
                .chains
                .iter()
                .map(|(chain, index)| (*chain, index.trie.len()))
                .collect(),
            entries_by_program,
            entries_by_type,
            irgc_linked: self.entries.iter().filter(|e| e.irgc_linked).count(),
            exchanges: self
                .entries
                .iter()
                .filter(|e| e.entity_type == EntityType::Exchange)
                .count(),
        }
    }
}

fn fingerprint(chains: &HashMap<ChainFamily, ChainIndex>, entries: &[Arc<SanctionsEntry>]) -> String {
    let mut triples: Vec<(ChainFamily, &str, &str)> = chains
        .iter()
        .flat_map(|(chain, index)| {
            index
                .slots
                .iter()
                .map(move |(addr, idx)| (*chain, addr.as_str(), entries[*idx].entry_id.as_str()))
        })
        .collect();
    triples.sort();

    let mut hasher = Sha256::new();
    for (chain, address, entry_id) in triples {
        hasher.update(chain.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(address.as_bytes());
        hasher.update([0u8]);
        hasher.update(entry_id.as_bytes());
        hasher.update([b'\n']);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
