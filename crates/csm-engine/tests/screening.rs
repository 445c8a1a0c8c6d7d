//! End-to-end screening scenarios through the engine facade.

use csm_alert::{AlertEvent, AlertFilter, AlertState};
use csm_core::{ChainFamily, CsmError, Participant, Role, Timestamp, Transaction, WatchlistVersion};
use csm_engine::{EngineConfig, ScreeningEngine, TransactionContext};
use csm_graph::AdjacencyGraph;
use csm_risk::{AnomalyKind, ContextFactors, FactorKind, RiskTier};
use csm_watchlist::{MatchKind, RawAddress, RawSanctionsRecord};

const LISTED: &str = "0x8589427373d6d84e98730d7795d8f6f8731fda16";

fn addr(n: u32) -> String {
    format!("0x{n:040x}")
}

fn version(label: &str) -> WatchlistVersion {
    WatchlistVersion::new(label).unwrap()
}

fn irgc_record() -> RawSanctionsRecord {
    RawSanctionsRecord {
        uid: "36512".to_string(),
        name: "Example IRGC Front".to_string(),
        sdn_type: "Entity".to_string(),
        programs: vec!["IRGC".to_string(), "SDGT".to_string()],
        designation_date: Some("2024-03-05".to_string()),
        addresses: vec![RawAddress {
            id_type: "Digital Currency Address - ETH".to_string(),
            address: "0x8589427373D6D84E98730D7795D8f6f8731FDA16".to_string(),
        }],
        ..RawSanctionsRecord::default()
    }
}

fn engine() -> ScreeningEngine {
    let engine = ScreeningEngine::new(EngineConfig::default()).unwrap();
    let report = engine.refresh_watchlist(version("ofac-2026-01-15"), vec![irgc_record()]);
    assert_eq!(report.entries.len(), 1);
    engine
}

fn transfer(hash: &str, from: &str, to: &str, asset: &str) -> Transaction {
    Transaction {
        chain: ChainFamily::Ethereum,
        hash: hash.to_string(),
        timestamp: Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        participants: vec![
            Participant { address: from.to_string(), role: Role::Sender },
            Participant { address: to.to_string(), role: Role::Receiver },
        ],
        amount: "50000".to_string(),
        asset: asset.to_string(),
        usd_value: None,
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn test_usdt_to_irgc_address_is_critical_with_new_alert() {
    let engine = engine();
    let tx = transfer("0xfeed01", &addr(0x100), LISTED, "USDT");
    let outcome = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();

    let score = &outcome.risk_score;
    assert_eq!(score.factor_names(), vec!["Direct match", "Stablecoin usage"]);
    assert!(score.factors[0].contribution > score.factors[1].contribution);
    assert_eq!(score.tier, RiskTier::Critical);
    assert_eq!(score.watchlist_version.as_str(), "ofac-2026-01-15");

    assert_eq!(outcome.matches[0].kind, MatchKind::None);
    assert_eq!(outcome.matches[1].kind, MatchKind::Exact);
    let entry = outcome.matches[1].entry.as_ref().unwrap();
    assert_eq!(entry.program, "IRGC, SDGT");
    assert!(entry.irgc_linked);

    let alert = outcome.alert.unwrap();
    assert_eq!(alert.state, AlertState::New);
    assert_eq!(alert.severity, RiskTier::Critical);
    assert_eq!(alert.key.designated_address.as_deref(), Some(LISTED));
    assert_eq!(alert.rationale.len(), 2);
}

#[test]
fn test_unlisted_pair_without_nearby_designation_is_low() {
    let engine = engine();
    let tx = transfer("0xfeed02", &addr(0xa1), &addr(0xa2), "ETH");
    // LISTED sits three hops from the sender: a1 - b1 - b2 - LISTED.
    let history = vec![
        transfer("0x01", &addr(0xa1), &addr(0xb1), "ETH"),
        transfer("0x02", &addr(0xb1), &addr(0xb2), "ETH"),
        transfer("0x03", &addr(0xb2), LISTED, "ETH"),
    ];
    let graph = AdjacencyGraph::from_transactions(history.iter().chain(std::iter::once(&tx)));
    let outcome = engine.score_transaction(&tx, &TransactionContext::with_graph(&graph)).unwrap();

    assert!(outcome.proximity.is_none());
    assert!(outcome.risk_score.factors.is_empty());
    assert_eq!(outcome.risk_score.tier, RiskTier::Low);
    assert!(outcome.alert.is_none());
    assert!(engine.list_alerts(&AlertFilter::default()).is_empty());
}

#[test]
fn test_one_hop_proximity_with_corridor_flag_alerts() {
    let engine = engine();
    let tx = transfer("0xfeed03", &addr(0xa1), &addr(0xa2), "ETH");
    let history = vec![transfer("0x01", &addr(0xa2), LISTED, "ETH")];
    let graph = AdjacencyGraph::from_transactions(&history);

    let plain = engine.score_transaction(&tx, &TransactionContext::with_graph(&graph)).unwrap();
    let proximity = plain.proximity.as_ref().unwrap();
    assert_eq!(proximity.hop_distance, 1);
    assert_eq!(proximity.source.as_str(), addr(0xa2));
    assert_eq!(plain.risk_score.tier, RiskTier::Medium);
    assert!(plain.alert.is_none());

    let context = TransactionContext {
        graph: Some(&graph),
        factors: ContextFactors::default().with_corridor("IR"),
    };
    let flagged = engine.score_transaction(&tx, &context).unwrap();
    assert_eq!(flagged.risk_score.factor_names(), vec!["Proximity", "Corridor flag"]);
    assert_eq!(flagged.risk_score.tier, RiskTier::High);
    let alert = flagged.alert.unwrap();
    assert_eq!(alert.key.designated_address.as_deref(), Some(LISTED));
}

fn entity_record(uid: &str, address: &str) -> RawSanctionsRecord {
    RawSanctionsRecord {
        uid: uid.to_string(),
        name: format!("Entity {uid}"),
        sdn_type: "Entity".to_string(),
        programs: vec!["IRGC".to_string()],
        addresses: vec![RawAddress {
            id_type: "Digital Currency Address - ETH".to_string(),
            address: address.to_string(),
        }],
        ..RawSanctionsRecord::default()
    }
}

#[test]
fn test_proximity_searches_past_directly_matched_counterparty() {
    // Sender touches two designated addresses one hop away. The first in
    // visiting order is the receiver, already counted as a direct match.
    let engine = ScreeningEngine::new(EngineConfig::default()).unwrap();
    engine.refresh_watchlist(
        version("v1"),
        vec![entity_record("sdn-a", &addr(0x10)), entity_record("sdn-b", &addr(0x20))],
    );
    let tx = transfer("0xfeed05", &addr(0x100), &addr(0x10), "ETH");
    let earlier = transfer("0x02", &addr(0x100), &addr(0x20), "ETH");
    let graph = AdjacencyGraph::from_transactions([&tx, &earlier]);

    let outcome = engine.score_transaction(&tx, &TransactionContext::with_graph(&graph)).unwrap();
    let proximity = outcome.proximity.as_ref().unwrap();
    assert_eq!(proximity.source.as_str(), addr(0x100));
    assert_eq!(proximity.nearest_designated.as_str(), addr(0x20));
    assert_eq!(proximity.hop_distance, 1);
    assert_eq!(proximity.entry.entry_id, "sdn-b");

    let score = &outcome.risk_score;
    assert_eq!(score.factor_names(), vec!["Direct match", "Proximity"]);
    assert_eq!(score.designated_address.as_ref().map(|a| a.as_str()), Some(addr(0x10).as_str()));
}

#[test]
fn test_outcome_serializes_for_reporting() {
    let engine = engine();
    let tx = transfer("0xfeed06", &addr(0x100), LISTED, "USDT");
    let outcome = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["risk_score"]["tier"], "CRITICAL");
    assert_eq!(json["risk_score"]["factors"][0]["kind"], "direct_match");
    assert_eq!(json["risk_score"]["watchlist_version"], "ofac-2026-01-15");
    assert_eq!(json["matches"].as_array().map(Vec::len), Some(2));
    assert!(json["proximity"].is_null());
    assert_eq!(json["alert"]["state"], "NEW");
    assert_eq!(json["alert"]["severity"], "CRITICAL");
}

#[test]
fn test_malformed_participant_is_scored_not_rejected() {
    let engine = engine();
    let tx = transfer("0xfeed04", "0x1234", LISTED, "ETH");
    let outcome = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();
    assert!(outcome.matches[0].invalid.is_some());
    assert!(outcome.risk_score.factor(FactorKind::MalformedAddress).is_some());
    assert_eq!(outcome.risk_score.tier, RiskTier::Critical);
}

// ── Alerts ──────────────────────────────────────────────────────────

#[test]
fn test_rescoring_same_transaction_keeps_one_alert() {
    let engine = engine();
    let tx = transfer("0xfeed05", &addr(0x100), LISTED, "USDT");
    let first = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();
    let second = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();

    assert_ne!(first.risk_score.score_id, second.risk_score.score_id);
    assert_eq!(first.alert.unwrap().alert_id, second.alert.unwrap().alert_id);
    assert_eq!(engine.list_alerts(&AlertFilter::default()).len(), 1);
}

#[test]
fn test_new_watchlist_version_raises_new_alert() {
    let engine = engine();
    let tx = transfer("0xfeed06", &addr(0x100), LISTED, "USDT");
    let first = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();

    engine.refresh_watchlist(version("ofac-2026-02-01"), vec![irgc_record()]);
    let second = engine.score_transaction(&tx, &TransactionContext::default()).unwrap();

    assert_eq!(second.risk_score.watchlist_version.as_str(), "ofac-2026-02-01");
    assert_ne!(first.alert.unwrap().alert_id, second.alert.unwrap().alert_id);
    assert_eq!(engine.list_alerts(&AlertFilter::default()).len(), 2);
}

#[test]
fn test_alert_lifecycle_through_engine() {
    let engine = engine();
    let tx = transfer("0xfeed07", &addr(0x100), LISTED, "USDT");
    let id = engine
        .score_transaction(&tx, &TransactionContext::default())
        .unwrap()
        .alert
        .unwrap()
        .alert_id;

    let err = engine.transition_alert(&id, AlertEvent::Close, "").unwrap_err();
    assert!(matches!(err, CsmError::InvalidTransition { .. }));

    engine.transition_alert(&id, AlertEvent::StartReview, "triage").unwrap();
    engine.transition_alert(&id, AlertEvent::Confirm, "confirmed").unwrap();
    let closed = engine.transition_alert(&id, AlertEvent::Close, "filed").unwrap();
    assert_eq!(closed.state, AlertState::Closed);

    let closed_alerts = engine.list_alerts(&AlertFilter {
        state: Some(AlertState::Closed),
        ..AlertFilter::default()
    });
    assert_eq!(closed_alerts.len(), 1);
    assert!(engine
        .list_alerts(&AlertFilter {
            state: Some(AlertState::New),
            ..AlertFilter::default()
        })
        .is_empty());
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_scoring_without_watchlist_is_unavailable() {
    let engine = ScreeningEngine::new(EngineConfig::default()).unwrap();
    let tx = transfer("0xfeed08", &addr(1), &addr(2), "ETH");
    let err = engine.score_transaction(&tx, &TransactionContext::default()).unwrap_err();
    assert!(matches!(err, CsmError::IndexUnavailable));
    assert!(matches!(engine.score_batch(&[]).unwrap_err(), CsmError::IndexUnavailable));
}

#[test]
fn test_unsupported_chain_is_propagated() {
    let engine = engine();
    let err = engine.screen_address("dogecoin", "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L").unwrap_err();
    match err {
        CsmError::UnsupportedChain(e) => assert_eq!(e.chain, "dogecoin"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_screen_address_reports_rule_for_malformed_input() {
    let engine = engine();
    let result = engine.screen_address("eth", "0x8589427373d6d84e98730d7795d8f6f8731fda1").unwrap();
    assert_eq!(result.kind, MatchKind::None);
    let invalid = result.invalid.unwrap();
    assert!(invalid.to_string().contains("wrong length"));
}

// ── Batch ───────────────────────────────────────────────────────────

#[test]
fn test_batch_preserves_order() {
    let mut config = EngineConfig::default();
    config.batch.workers = 3;
    let engine = ScreeningEngine::new(config).unwrap();
    engine.refresh_watchlist(version("v1"), vec![irgc_record()]);

    let items: Vec<(Transaction, TransactionContext<'_>)> = (0..10u32)
        .map(|i| {
            let to = if i % 3 == 0 { LISTED.to_string() } else { addr(0x200 + i) };
            let tx = transfer(&format!("0xb{i:03}"), &addr(0x100 + i), &to, "ETH");
            let context = TransactionContext {
                graph: None,
                factors: if i == 4 {
                    ContextFactors::default().with_anomaly(AnomalyKind::Volume)
                } else {
                    ContextFactors::default()
                },
            };
            (tx, context)
        })
        .collect();

    let outcomes = engine.score_batch(&items).unwrap();
    assert_eq!(outcomes.len(), 10);
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.risk_score.transaction_hash, format!("0xb{i:03}"));
        let expected = if i % 3 == 0 { RiskTier::Critical } else { RiskTier::Low };
        assert_eq!(outcome.risk_score.tier, expected, "transaction {i}");
    }
    assert!(outcomes[4].risk_score.factor(FactorKind::VelocityAnomaly).is_some());
    assert_eq!(engine.list_alerts(&AlertFilter::default()).len(), 4);
}
