//! # Screening Engine
//!
//! Facade over the watchlist store, matcher, proximity resolver, scorer and
//! alert manager.
//!
//! ## Snapshots
//!
//! Each call takes exactly one watchlist snapshot and runs against it to the
//! end. A concurrent refresh publishes a new snapshot without waiting for
//! readers; the old one is dropped when its last reader finishes. Batch
//! scoring shares one snapshot across all its workers.
//!
//! ## Per-transaction pipeline
//!
//! ```text
//! participants ──normalize/match──▶ MatchResult*
//!              ──resolve_proximity─▶ nearest ProximityResult (hops >= 1,
//!                                     exact hits passed through)
//!                                     │
//!                       RiskScorer::score ──▶ RiskScore ──▶ raise (HIGH+)
//! ```

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;

use csm_alert::{Alert, AlertEvent, AlertFilter, AlertManager};
use csm_core::{AlertId, ChainFamily, CsmError, NormalizedAddress, Transaction, WatchlistVersion};
use csm_graph::{resolve_proximity_excluding, CounterpartyGraph, ProximityResult};
use csm_risk::{ContextFactors, RiskScore, RiskScorer};
use csm_watchlist::{
    ingest, IngestReport, MatchKind, MatchResult, Matcher, RawSanctionsRecord, SanctionsEntry, WatchlistIndex,
    WatchlistStats, WatchlistStore,
};

use crate::config::EngineConfig;

/// What the caller knows about a transaction besides the chain data.
#[derive(Clone, Default)]
pub struct TransactionContext<'g> {
    /// Counterparty window for proximity. `None` skips proximity.
    pub graph: Option<&'g (dyn CounterpartyGraph + Sync)>,
    /// Corridor, stablecoin and anomaly inputs.
    pub factors: ContextFactors,
}

impl<'g> TransactionContext<'g> {
    /// Context with a counterparty graph and no factors.
    pub fn with_graph(graph: &'g (dyn CounterpartyGraph + Sync)) -> Self {
        Self {
            graph: Some(graph),
            factors: ContextFactors::default(),
        }
    }
}

impl std::fmt::Debug for TransactionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("graph", &self.graph.is_some())
            .field("factors", &self.factors)
            .finish()
    }
}

/// Everything produced while screening one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    /// The score.
    pub risk_score: RiskScore,
    /// One match result per participant, in participant order.
    pub matches: Vec<MatchResult>,
    /// Nearest designated address at one hop or more, if any.
    pub proximity: Option<ProximityResult>,
    /// Alert raised or found for this score, when the tier is HIGH or above.
    pub alert: Option<Alert>,
}

/// The screening engine.
pub struct ScreeningEngine {
    config: EngineConfig,
    store: WatchlistStore,
    matcher: Matcher,
    scorer: RiskScorer,
    alerts: AlertManager,
}

impl ScreeningEngine {
    /// Engine with no watchlist loaded.
    pub fn new(config: EngineConfig) -> Result<Self, CsmError> {
        config.validate()?;
        let scorer = RiskScorer::new(config.scoring.clone())?;
        Ok(Self {
            matcher: Matcher::new(config.matching.near_max_distance),
            scorer,
            store: WatchlistStore::new(),
            alerts: AlertManager::new(),
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The alert manager.
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Ingest raw records, build a new index and publish it.
    ///
    /// Skipped records are reported, not fatal. The returned report holds
    /// the accepted entries as ingested.
    pub fn refresh_watchlist(&self, version: WatchlistVersion, records: Vec<RawSanctionsRecord>) -> IngestReport {
        let received = records.len();
        let report = ingest(records, &self.config.ingest);
        tracing::info!(
            version = %version,
            received,
            accepted = report.entries.len(),
            skipped = report.skipped_records.len(),
            filtered = report.filtered_records,
            skipped_addresses = report.skipped_addresses.len(),
            "watchlist ingested"
        );
        self.load_entries(version, report.entries.clone());
        report
    }

    /// Build an index from already validated entries and publish it.
    pub fn load_entries(&self, version: WatchlistVersion, entries: Vec<SanctionsEntry>) -> WatchlistStats {
        let index = WatchlistIndex::build(version, entries);
        let stats = index.stats();
        self.store.publish(index);
        stats
    }

    /// Statistics of the current snapshot.
    pub fn watchlist_stats(&self) -> Result<WatchlistStats, CsmError> {
        Ok(self.store.snapshot()?.stats())
    }

    /// Version of the current snapshot, if any.
    pub fn watchlist_version(&self) -> Option<WatchlistVersion> {
        self.store.current_version()
    }

    // ── Screening ───────────────────────────────────────────────────

    /// Screen one address given a chain label such as `eth` or `tron`.
    pub fn screen_address(&self, chain: &str, address: &str) -> Result<MatchResult, CsmError> {
        let chain: ChainFamily = chain.parse()?;
        let index = self.store.snapshot()?;
        Ok(self.matcher.match_address(chain, address, &index))
    }

    /// Match, resolve proximity, score, and raise an alert when the tier is
    /// HIGH or CRITICAL.
    pub fn score_transaction(
        &self,
        tx: &Transaction,
        context: &TransactionContext<'_>,
    ) -> Result<ScreeningOutcome, CsmError> {
        let index = self.store.snapshot()?;
        self.score_with(&index, tx, context)
    }

    /// Score transactions in parallel against one snapshot. Results keep
    /// input order.
    pub fn score_batch(
        &self,
        items: &[(Transaction, TransactionContext<'_>)],
    ) -> Result<Vec<ScreeningOutcome>, CsmError> {
        let index = self.store.snapshot()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let workers = self.config.batch.workers.clamp(1, items.len());
        let chunk_size = items.len().div_ceil(workers);
        tracing::debug!(transactions = items.len(), workers, "batch scoring");

        let chunks: Vec<Result<Vec<ScreeningOutcome>, CsmError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks(chunk_size)
                .map(|chunk| {
                    let index = &index;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|(tx, ctx)| self.score_with(index, tx, ctx))
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
                .collect()
        });

        let mut out = Vec::with_capacity(items.len());
        for chunk in chunks {
            out.extend(chunk?);
        }
        Ok(out)
    }

    fn score_with(
        &self,
        index: &Arc<WatchlistIndex>,
        tx: &Transaction,
        context: &TransactionContext<'_>,
    ) -> Result<ScreeningOutcome, CsmError> {
        let matches: Vec<MatchResult> = tx
            .participants
            .iter()
            .map(|p| self.matcher.match_address(tx.chain, &p.address, index))
            .collect();

        let proximity = context
            .graph
            .and_then(|graph| self.nearest_designated(&matches, graph, index));

        let risk_score = self.scorer.score(
            tx,
            &matches,
            proximity.as_ref(),
            &context.factors,
            index.version(),
        );

        let alert = if risk_score.tier.is_alertable() {
            Some(self.alerts.raise(&risk_score)?)
        } else {
            None
        };

        Ok(ScreeningOutcome {
            risk_score,
            matches,
            proximity,
            alert,
        })
    }

    /// Closest designated address at one hop or more from any participant.
    /// Addresses already matched exactly are searched through, not
    /// reported. Ties go to the lexicographically smaller source, then
    /// target.
    fn nearest_designated(
        &self,
        matches: &[MatchResult],
        graph: &(dyn CounterpartyGraph + Sync),
        index: &WatchlistIndex,
    ) -> Option<ProximityResult> {
        let sources: BTreeSet<&NormalizedAddress> = matches.iter().filter_map(|m| m.normalized.as_ref()).collect();
        let matched: HashSet<NormalizedAddress> = matches
            .iter()
            .filter(|m| m.kind == MatchKind::Exact)
            .filter_map(|m| m.designated_address.clone())
            .collect();
        sources
            .into_iter()
            .filter_map(|source| resolve_proximity_excluding(source, &self.config.proximity, graph, index, &matched))
            .filter(|p| p.hop_distance > 0)
            .min_by(|a, b| {
                a.hop_distance
                    .cmp(&b.hop_distance)
                    .then_with(|| a.source.cmp(&b.source))
                    .then_with(|| a.nearest_designated.cmp(&b.nearest_designated))
            })
    }

    // ── Alerts ──────────────────────────────────────────────────────

    /// Alerts passing `filter`, oldest first.
    pub fn list_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.alerts.list(filter)
    }

    /// Apply a lifecycle event to an alert.
    pub fn transition_alert(&self, alert_id: &AlertId, event: AlertEvent, note: &str) -> Result<Alert, CsmError> {
        self.alerts.transition(alert_id, event, note)
    }
}

impl std::fmt::Debug for ScreeningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreeningEngine")
            .field("watchlist_version", &self.store.current_version())
            .field("near_threshold", &self.matcher.near_threshold())
            .field("alerts", &self.alerts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csm_watchlist::RawAddress;

    fn record(uid: &str, program: &str, chain: &str, address: &str) -> RawSanctionsRecord {
        RawSanctionsRecord {
            uid: uid.to_string(),
            name: format!("Entity {uid}"),
            sdn_type: "Entity".to_string(),
            programs: vec![program.to_string()],
            addresses: vec![RawAddress {
                id_type: chain.to_string(),
                address: address.to_string(),
            }],
            ..RawSanctionsRecord::default()
        }
    }

    #[test]
    fn test_screen_before_refresh_is_unavailable() {
        let engine = ScreeningEngine::new(EngineConfig::default()).unwrap();
        let err = engine
            .screen_address("eth", "0x8589427373d6d84e98730d7795d8f6f8731fda16")
            .unwrap_err();
        assert!(matches!(err, CsmError::IndexUnavailable));
    }

    #[test]
    fn test_refresh_applies_program_filter() {
        let mut config = EngineConfig::default();
        config.ingest.program_filter = vec!["IRGC".to_string()];
        let engine = ScreeningEngine::new(config).unwrap();
        let report = engine.refresh_watchlist(
            WatchlistVersion::new("v1").unwrap(),
            vec![
                record("1", "IRGC", "ETH", "0x8589427373d6d84e98730d7795d8f6f8731fda16"),
                record("2", "CYBER2", "ETH", "0x00000000000000000000000000000000000000aa"),
            ],
        );
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.filtered_records, 1);

        let hit = engine
            .screen_address("ethereum", "0x8589427373D6D84E98730D7795D8F6F8731FDA16")
            .unwrap();
        assert_eq!(hit.kind, MatchKind::Exact);
        let miss = engine
            .screen_address("eth", "0x00000000000000000000000000000000000000aa")
            .unwrap();
        assert_eq!(miss.kind, MatchKind::None);
        assert_eq!(engine.watchlist_stats().unwrap().entries, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.batch.workers = 0;
        assert!(ScreeningEngine::new(config).is_err());
    }
}
