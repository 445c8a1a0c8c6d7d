//! # Risk Scorer
//!
//! Combines matcher output, graph proximity and caller context into one
//! bounded score.
//!
//! ## Model
//!
//! Each triggered factor contributes `weight * normalized_value`, with the
//! normalized value in `0.0..=1.0`. The total is the sum of contributions
//! clamped to `0..=100`, and the tier is read off [`TierThresholds`].
//! Factors are evaluated and recorded in a fixed order:
//!
//! | Factor | Trigger | Normalized value |
//! |---|---|---|
//! | Direct match | any participant matched EXACT | 1 |
//! | Near match | any participant matched NEAR | 1 / distance |
//! | Proximity | designated address 1+ hops away | 1 / hops |
//! | Corridor flag | caller supplied at least one | 1 |
//! | Stablecoin usage | asset in the watch set | 1 |
//! | Velocity/volume anomaly | caller supplied at least one | 1 |
//! | Malformed address | a participant failed validation | 1 |
//! | High value | USD value at or above the threshold | 1 |
//!
//! Weights are non-negative, so adding a triggered factor can never lower
//! the total.
//!
//! ## Rules
//!
//! - A score is produced once and never edited. Re-scoring against another
//!   watchlist version yields a new [`RiskScore`] with a new id.
//! - Proximity at hop 0, or to an address already counted as a direct
//!   match, adds nothing.
//!
//! [`TierThresholds`]: crate::config::TierThresholds

use serde::Serialize;

use csm_core::{ChainFamily, CsmError, NormalizedAddress, ScoreId, Timestamp, Transaction, WatchlistVersion};
use csm_graph::ProximityResult;
use csm_watchlist::{MatchKind, MatchResult};

use crate::config::{ScoringConfig, MAX_SCORE};
use crate::context::{AnomalyKind, ContextFactors};
use crate::factor::{FactorKind, RiskFactor};
use crate::tier::RiskTier;

/// Outcome of scoring one transaction against one watchlist version.
#[derive(Debug, Clone, Serialize)]
pub struct RiskScore {
    /// Unique id of this scoring run.
    pub score_id: ScoreId,
    /// Transaction hash in key form.
    pub transaction_hash: String,
    /// Chain of the transaction.
    pub chain: ChainFamily,
    /// Watchlist version the matches ran against.
    pub watchlist_version: WatchlistVersion,
    /// Triggered factors in evaluation order.
    pub factors: Vec<RiskFactor>,
    /// Clamped sum of contributions.
    pub total: f64,
    /// Tier of `total`.
    pub tier: RiskTier,
    /// The designated address that drove the score, if any. Exact matches
    /// take precedence over near matches, which take precedence over
    /// proximity.
    pub designated_address: Option<NormalizedAddress>,
    /// Entry owning `designated_address`.
    pub designated_entry_id: Option<String>,
    /// When the score was generated.
    pub generated_at: Timestamp,
}

impl RiskScore {
    /// The factor of the given kind, if it triggered.
    pub fn factor(&self, kind: FactorKind) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.kind == kind)
    }

    /// Factor names in evaluation order.
    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Weighted factor scorer.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    /// Create a scorer after validating `config`.
    pub fn new(config: ScoringConfig) -> Result<Self, CsmError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `tx` from per-participant `matches`, the best `proximity`
    /// result across its participants, and caller `context`.
    pub fn score(
        &self,
        tx: &Transaction,
        matches: &[MatchResult],
        proximity: Option<&ProximityResult>,
        context: &ContextFactors,
        watchlist_version: &WatchlistVersion,
    ) -> RiskScore {
        let weights = &self.config.weights;
        let mut factors = Vec::new();
        let mut designated: Option<(NormalizedAddress, String)> = None;

        // Direct match
        let exact: Vec<&MatchResult> = matches.iter().filter(|m| m.kind == MatchKind::Exact).collect();
        if let Some(first) = exact.first() {
            designated = designation_of(first);
            let detail = exact
                .iter()
                .map(|m| describe_match(m))
                .collect::<Vec<_>>()
                .join("; ");
            factors.push(RiskFactor::new(
                FactorKind::DirectMatch,
                exact.len() as f64,
                1.0,
                weights.direct_match,
                detail,
            ));
        }

        // Near match: closest wins, then first reported.
        let closest_near = matches
            .iter()
            .filter(|m| m.kind == MatchKind::Near)
            .filter_map(|m| m.distance.map(|d| (d, m)))
            .min_by_key(|(d, _)| *d);
        if let Some((distance, m)) = closest_near {
            if designated.is_none() {
                designated = designation_of(m);
            }
            let distance = distance.max(1);
            factors.push(RiskFactor::new(
                FactorKind::NearMatch,
                f64::from(distance),
                1.0 / f64::from(distance),
                weights.near_match,
                describe_match(m),
            ));
        }

        // Proximity
        if let Some(p) = proximity {
            let already_counted = exact
                .iter()
                .any(|m| m.designated_address.as_ref() == Some(&p.nearest_designated));
            if p.hop_distance > 0 && !already_counted {
                if designated.is_none() {
                    designated = Some((p.nearest_designated.clone(), p.entry.entry_id.clone()));
                }
                factors.push(RiskFactor::new(
                    FactorKind::Proximity,
                    f64::from(p.hop_distance),
                    1.0 / f64::from(p.hop_distance),
                    weights.proximity,
                    format!(
                        "{} is {} hop(s) from {} ({}, {})",
                        p.source, p.hop_distance, p.nearest_designated, p.entry.entity_name, p.entry.program
                    ),
                ));
            }
        }

        // Corridor flags
        if !context.corridor_flags.is_empty() {
            let codes: Vec<&str> = context.corridor_flags.iter().map(|c| c.code.as_str()).collect();
            factors.push(RiskFactor::new(
                FactorKind::CorridorFlag,
                codes.len() as f64,
                1.0,
                weights.corridor_flag,
                codes.join(", "),
            ));
        }

        // Stablecoin usage
        let asset = tx.asset_symbol();
        let watch_set = context
            .stablecoin_watch_set
            .as_ref()
            .unwrap_or(&self.config.default_stablecoin_watch_set);
        if watch_set.iter().any(|s| s.trim().eq_ignore_ascii_case(&asset)) {
            factors.push(RiskFactor::new(
                FactorKind::StablecoinUsage,
                1.0,
                1.0,
                weights.stablecoin_usage,
                format!("{} {asset}", tx.amount.trim()),
            ));
        }

        // Velocity/volume anomaly
        if !context.anomalies.is_empty() {
            let kinds: Vec<&str> = context
                .anomalies
                .iter()
                .map(|a| match a.kind {
                    AnomalyKind::Velocity => "velocity",
                    AnomalyKind::Volume => "volume",
                })
                .collect();
            factors.push(RiskFactor::new(
                FactorKind::VelocityAnomaly,
                kinds.len() as f64,
                1.0,
                weights.velocity_anomaly,
                kinds.join(", "),
            ));
        }

        // Malformed addresses
        let malformed: Vec<String> = matches
            .iter()
            .filter_map(|m| m.invalid.as_ref().map(|e| e.to_string()))
            .collect();
        if !malformed.is_empty() {
            factors.push(RiskFactor::new(
                FactorKind::MalformedAddress,
                malformed.len() as f64,
                1.0,
                weights.malformed_address,
                malformed.join("; "),
            ));
        }

        // High value
        if let (Some(threshold), Some(usd)) = (self.config.high_value_threshold_usd, tx.usd_value) {
            if usd >= threshold {
                factors.push(RiskFactor::new(
                    FactorKind::HighValue,
                    usd as f64,
                    1.0,
                    weights.high_value,
                    format!("USD {usd} >= {threshold}"),
                ));
            }
        }

        let total = factors
            .iter()
            .map(|f| f.contribution)
            .sum::<f64>()
            .clamp(0.0, MAX_SCORE);
        let tier = RiskTier::from_score(total, &self.config.tiers);

        let score = RiskScore {
            score_id: ScoreId::new(),
            transaction_hash: tx.hash_key(),
            chain: tx.chain,
            watchlist_version: watchlist_version.clone(),
            factors,
            total,
            tier,
            designated_address: designated.as_ref().map(|(a, _)| a.clone()),
            designated_entry_id: designated.map(|(_, id)| id),
            generated_at: Timestamp::now(),
        };
        tracing::debug!(
            tx = %score.transaction_hash,
            total = score.total,
            tier = %score.tier,
            factors = score.factors.len(),
            "transaction scored"
        );
        score
    }
}

fn designation_of(m: &MatchResult) -> Option<(NormalizedAddress, String)> {
    match (&m.designated_address, &m.entry) {
        (Some(addr), Some(entry)) => Some((addr.clone(), entry.entry_id.clone())),
        _ => None,
    }
}

fn describe_match(m: &MatchResult) -> String {
    match (&m.designated_address, &m.entry) {
        (Some(addr), Some(entry)) => format!(
            "{} matched {} ({}, {}) at distance {}",
            m.query.trim(),
            addr,
            entry.entity_name,
            entry.program,
            m.distance.unwrap_or(0)
        ),
        _ => m.query.trim().to_string(),
    }
}
