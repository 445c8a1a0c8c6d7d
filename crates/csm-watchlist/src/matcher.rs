//! # Address Matcher
//!
//! Screens one raw address against a watchlist snapshot.
//!
//! ## Algorithm
//!
//! 1. Normalize. A malformed address is not an error here: the result is
//!    [`MatchKind::None`] with the validation failure attached, and the risk
//!    scorer turns that into a weak signal.
//! 2. Exact lookup. A hit is final.
//! 3. Near lookup bounded by the matcher's threshold. When several designated
//!    addresses sit at the same smallest distance, the winner is the entry
//!    with the most recent designation date, then the lexicographically
//!    smallest entity name, then the smallest address.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use csm_core::{normalize, ChainFamily, InvalidAddressError, NormalizedAddress, WatchlistVersion};

use crate::entry::SanctionsEntry;
use crate::index::{NearHit, WatchlistIndex, MAX_NEAR_DISTANCE};

/// How an address matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    /// The normalized address is designated.
    Exact,
    /// A designated address is within the near-match threshold.
    Near,
    /// No match, or the address was malformed.
    None,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Exact => "EXACT",
            Self::Near => "NEAR",
            Self::None => "NONE",
        })
    }
}

/// Outcome of screening one address.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Match classification.
    pub kind: MatchKind,
    /// Chain family screened against.
    pub chain: ChainFamily,
    /// The address as supplied.
    pub query: String,
    /// Normalized query, absent when normalization failed.
    pub normalized: Option<NormalizedAddress>,
    /// Owning entry of the matched address.
    pub entry: Option<Arc<SanctionsEntry>>,
    /// The designated address that matched.
    pub designated_address: Option<NormalizedAddress>,
    /// Edit distance; 0 for exact matches.
    pub distance: Option<u8>,
    /// Validation failure for malformed input.
    pub invalid: Option<InvalidAddressError>,
    /// Snapshot the match ran against.
    pub watchlist_version: WatchlistVersion,
}

impl MatchResult {
    /// Whether the result is an exact or near match.
    pub fn is_match(&self) -> bool {
        self.kind != MatchKind::None
    }

    fn none(chain: ChainFamily, query: &str, index: &WatchlistIndex) -> Self {
        Self {
            kind: MatchKind::None,
            chain,
            query: query.to_string(),
            normalized: None,
            entry: None,
            designated_address: None,
            distance: None,
            invalid: None,
            watchlist_version: index.version().clone(),
        }
    }
}

/// Address matcher with a fixed near-match threshold.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    near_threshold: u8,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NEAR_THRESHOLD)
    }
}

impl Matcher {
    /// Default near-match threshold: one edit.
    pub const DEFAULT_NEAR_THRESHOLD: u8 = 1;

    /// Matcher with the given threshold, clamped to [`MAX_NEAR_DISTANCE`].
    /// Zero disables near matching.
    pub fn new(near_threshold: u8) -> Self {
        Self {
            near_threshold: near_threshold.min(MAX_NEAR_DISTANCE),
        }
    }

    /// The effective threshold.
    pub fn near_threshold(&self) -> u8 {
        self.near_threshold
    }

    /// Screen `raw` on `chain` against `index`.
    pub fn match_address(&self, chain: ChainFamily, raw: &str, index: &WatchlistIndex) -> MatchResult {
        let mut result = MatchResult::none(chain, raw, index);
        let normalized = match normalize(chain, raw) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(chain = %chain, error = %e, "address failed normalization");
                result.invalid = Some(e);
                return result;
            }
        };

        if let Some(entry) = index.lookup_exact(&normalized) {
            result.kind = MatchKind::Exact;
            result.entry = Some(Arc::clone(entry));
            result.designated_address = Some(normalized.clone());
            result.distance = Some(0);
            result.normalized = Some(normalized);
            return result;
        }

        if self.near_threshold > 0 {
            let mut hits = index.lookup_near(&normalized, self.near_threshold);
            hits.sort_by(near_precedence);
            if let Some(best) = hits.into_iter().next() {
                tracing::debug!(
                    query = %normalized,
                    designated = %best.address,
                    distance = best.distance,
                    "near match"
                );
                result.kind = MatchKind::Near;
                result.entry = Some(best.entry);
                result.designated_address = Some(best.address);
                result.distance = Some(best.distance);
            }
        }
        result.normalized = Some(normalized);
        result
    }
}

/// Smallest distance, then newest designation (undated last), then entity
/// name, then address.
fn near_precedence(a: &NearHit, b: &NearHit) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| b.entry.designation_date.cmp(&a.entry.designation_date))
        .then_with(|| a.entry.entity_name.cmp(&b.entry.entity_name))
        .then_with(|| a.address.cmp(&b.address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntityType;
    use chrono::NaiveDate;
    use csm_core::AddressRule;

    // Designated addresses differ only in their last two hex digits.
    const BASE: &str = "0x7f367cc41522ce07553e823bf3be79a889debe";
    const TRON_USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    fn addr(suffix: &str) -> String {
        format!("{BASE}{suffix}")
    }

    fn entry(id: &str, name: &str, date: Option<(i32, u32, u32)>, suffix: &str) -> SanctionsEntry {
        let mut e = SanctionsEntry::new(id, "IRGC", name, EntityType::Organization)
            .with_address(ChainFamily::Ethereum, &addr(suffix))
            .unwrap();
        e.designation_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        e
    }

    fn build(entries: Vec<SanctionsEntry>) -> WatchlistIndex {
        WatchlistIndex::build(WatchlistVersion::new("v1").unwrap(), entries)
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let index = build(vec![entry("1", "Alpha", None, "1b")]);
        let upper = addr("1b").to_ascii_uppercase().replacen("0X", "0x", 1);
        let result = Matcher::default().match_address(ChainFamily::Ethereum, &upper, &index);
        assert_eq!(result.kind, MatchKind::Exact);
        assert_eq!(result.entry.as_ref().unwrap().entry_id, "1");
        assert_eq!(result.distance, Some(0));
        assert_eq!(result.designated_address.unwrap().as_str(), addr("1b"));
        assert_eq!(result.watchlist_version.as_str(), "v1");
    }

    #[test]
    fn test_exact_match_tron() {
        let e = SanctionsEntry::new("9", "IRAN", "T", EntityType::Exchange)
            .with_address(ChainFamily::Tron, TRON_USDT)
            .unwrap();
        let index = build(vec![e]);
        let result = Matcher::default().match_address(ChainFamily::Tron, TRON_USDT, &index);
        assert_eq!(result.kind, MatchKind::Exact);
    }

    #[test]
    fn test_near_match_one_character() {
        let index = build(vec![entry("1", "Alpha", None, "1b")]);
        let result = Matcher::new(1).match_address(ChainFamily::Ethereum, &addr("1c"), &index);
        assert_eq!(result.kind, MatchKind::Near);
        assert_eq!(result.distance, Some(1));
        assert_eq!(result.entry.unwrap().entry_id, "1");
        assert_eq!(result.normalized.unwrap().as_str(), addr("1c"));
    }

    #[test]
    fn test_beyond_threshold_is_none() {
        let index = build(vec![entry("1", "Alpha", None, "1b")]);
        let result = Matcher::new(1).match_address(ChainFamily::Ethereum, &addr("2c"), &index);
        assert_eq!(result.kind, MatchKind::None);
        assert!(result.entry.is_none());
        assert!(result.invalid.is_none());

        let wider = Matcher::new(2).match_address(ChainFamily::Ethereum, &addr("2c"), &index);
        assert_eq!(wider.kind, MatchKind::Near);
        assert_eq!(wider.distance, Some(2));
    }

    #[test]
    fn test_threshold_is_capped() {
        assert_eq!(Matcher::new(7).near_threshold(), MAX_NEAR_DISTANCE);
    }

    #[test]
    fn test_zero_threshold_disables_near() {
        let index = build(vec![entry("1", "Alpha", None, "1b")]);
        let result = Matcher::new(0).match_address(ChainFamily::Ethereum, &addr("1c"), &index);
        assert_eq!(result.kind, MatchKind::None);
    }

    #[test]
    fn test_near_tie_prefers_recent_designation() {
        let index = build(vec![
            entry("old", "Alpha", Some((2020, 5, 1)), "00"),
            entry("new", "Zeta", Some((2024, 5, 1)), "11"),
            entry("undated", "Aaa", None, "22"),
        ]);
        // "01" is one edit from "00" and from "11"; "21" is one edit from "22" too.
        let result = Matcher::new(1).match_address(ChainFamily::Ethereum, &addr("01"), &index);
        assert_eq!(result.entry.unwrap().entry_id, "new");
        let result = Matcher::new(1).match_address(ChainFamily::Ethereum, &addr("21"), &index);
        assert_eq!(result.entry.unwrap().entry_id, "new");
    }

    #[test]
    fn test_near_tie_same_date_prefers_entity_name() {
        let date = Some((2023, 1, 1));
        let index = build(vec![entry("b", "Bravo", date, "00"), entry("a", "Alpha", date, "11")]);
        let result = Matcher::new(1).match_address(ChainFamily::Ethereum, &addr("01"), &index);
        assert_eq!(result.entry.unwrap().entity_name, "Alpha");
    }

    #[test]
    fn test_closer_hit_beats_recent_designation() {
        let index = build(vec![
            entry("far", "Far", Some((2025, 1, 1)), "00"),
            entry("near", "Near", Some((2001, 1, 1)), "0a"),
        ]);
        let result = Matcher::new(2).match_address(ChainFamily::Ethereum, &addr("0a"), &index);
        assert_eq!(result.kind, MatchKind::Exact);
        let result = Matcher::new(2).match_address(ChainFamily::Ethereum, &addr("1a"), &index);
        assert_eq!(result.entry.unwrap().entry_id, "near");
        assert_eq!(result.distance, Some(1));
    }

    #[test]
    fn test_malformed_address_is_none_with_reason() {
        let index = build(vec![entry("1", "Alpha", None, "1b")]);
        let result = Matcher::default().match_address(ChainFamily::Ethereum, "0xnothex", &index);
        assert_eq!(result.kind, MatchKind::None);
        assert!(result.normalized.is_none());
        let invalid = result.invalid.unwrap();
        assert!(matches!(invalid.rule, AddressRule::WrongLength { .. }));
    }
}
