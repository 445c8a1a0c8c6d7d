//! # csm-watchlist: Sanctions Watchlist and Address Matching
//!
//! ## Pipeline
//!
//! ```text
//! RawSanctionsRecord ──ingest──▶ SanctionsEntry ──build──▶ WatchlistIndex
//!                                                              │
//!                                          WatchlistStore::publish (atomic swap)
//!                                                              │
//!                   Matcher::match_address ◀── snapshot() ─────┘
//! ```
//!
//! - [`ingest`] validates raw SDN records, skipping and counting malformed
//!   ones.
//! - [`WatchlistIndex`] is immutable and versioned: exact hash lookup plus a
//!   trie for bounded edit-distance lookup, per chain family.
//! - [`WatchlistStore`] publishes snapshots; readers hold one `Arc` per
//!   operation.
//! - [`Matcher`] produces a [`MatchResult`] of kind EXACT, NEAR, or NONE.

pub mod entry;
pub mod index;
pub mod ingest;
pub mod matcher;
pub mod store;
mod trie;

pub use entry::{AddressRecord, EntityType, SanctionsEntry};
pub use index::{NearHit, WatchlistIndex, WatchlistStats, MAX_NEAR_DISTANCE};
pub use ingest::{
    ingest, IngestConfig, IngestReport, RawAddress, RawSanctionsRecord, SkippedAddress,
    SkippedRecord,
};
pub use matcher::{MatchKind, MatchResult, Matcher};
pub use store::WatchlistStore;
