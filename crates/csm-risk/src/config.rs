//! Scoring configuration.
//!
//! Weights and tier thresholds are calibration data, not constants. Every
//! field has a serde default, so a config file only needs to name what it
//! changes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use csm_core::CsmError;

/// Upper bound of the score range.
pub const MAX_SCORE: f64 = 100.0;

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-factor weights.
    #[serde(default)]
    pub weights: FactorWeights,

    /// Tier cut-offs.
    #[serde(default)]
    pub tiers: TierThresholds,

    /// Stablecoin symbols used when the caller's context does not supply
    /// its own watch set.
    #[serde(default = "default_stablecoins")]
    pub default_stablecoin_watch_set: BTreeSet<String>,

    /// Transfers at or above this USD value trigger the high-value factor.
    /// Unset disables the factor.
    #[serde(default)]
    pub high_value_threshold_usd: Option<u64>,
}

/// Weight applied to each factor's normalized value (0.0..=1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    /// Exact watchlist match on any participant.
    #[serde(default = "default_direct_match")]
    pub direct_match: f64,
    /// Near watchlist match; scaled by 1/distance.
    #[serde(default = "default_near_match")]
    pub near_match: f64,
    /// Designated address within reach; scaled by 1/hops.
    #[serde(default = "default_proximity")]
    pub proximity: f64,
    /// Caller-supplied jurisdictional flags.
    #[serde(default = "default_corridor")]
    pub corridor_flag: f64,
    /// Asset in the stablecoin watch set.
    #[serde(default = "default_stablecoin")]
    pub stablecoin_usage: f64,
    /// Caller-supplied velocity or volume outlier.
    #[serde(default = "default_anomaly")]
    pub velocity_anomaly: f64,
    /// A participant address failed validation.
    #[serde(default = "default_malformed")]
    pub malformed_address: f64,
    /// USD value at or above the configured threshold.
    #[serde(default = "default_high_value")]
    pub high_value: f64,
}

/// Minimum totals for each tier above LOW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// CRITICAL at or above.
    #[serde(default = "default_critical")]
    pub critical: f64,
    /// HIGH at or above.
    #[serde(default = "default_high")]
    pub high: f64,
    /// MEDIUM at or above.
    #[serde(default = "default_medium")]
    pub medium: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            tiers: TierThresholds::default(),
            default_stablecoin_watch_set: default_stablecoins(),
            high_value_threshold_usd: None,
        }
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            direct_match: default_direct_match(),
            near_match: default_near_match(),
            proximity: default_proximity(),
            corridor_flag: default_corridor(),
            stablecoin_usage: default_stablecoin(),
            velocity_anomaly: default_anomaly(),
            malformed_address: default_malformed(),
            high_value: default_high_value(),
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            medium: default_medium(),
        }
    }
}

impl ScoringConfig {
    /// Check weights and thresholds.
    ///
    /// Weights must be finite and non-negative. Thresholds must satisfy
    /// `0 < medium < high < critical <= 100`.
    pub fn validate(&self) -> Result<(), CsmError> {
        let w = &self.weights;
        let named = [
            ("direct_match", w.direct_match),
            ("near_match", w.near_match),
            ("proximity", w.proximity),
            ("corridor_flag", w.corridor_flag),
            ("stablecoin_usage", w.stablecoin_usage),
            ("velocity_anomaly", w.velocity_anomaly),
            ("malformed_address", w.malformed_address),
            ("high_value", w.high_value),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CsmError::Config(format!(
                    "weight {name} must be a finite non-negative number, got {weight}"
                )));
            }
        }

        let t = &self.tiers;
        let ordered = t.medium > 0.0 && t.medium < t.high && t.high < t.critical && t.critical <= MAX_SCORE;
        if !ordered {
            return Err(CsmError::Config(format!(
                "tier thresholds must satisfy 0 < medium < high < critical <= {MAX_SCORE}, got medium={} high={} critical={}",
                t.medium, t.high, t.critical
            )));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_direct_match() -> f64 {
    100.0
}

fn default_near_match() -> f64 {
    70.0
}

fn default_proximity() -> f64 {
    45.0
}

fn default_corridor() -> f64 {
    30.0
}

fn default_stablecoin() -> f64 {
    15.0
}

fn default_anomaly() -> f64 {
    20.0
}

fn default_malformed() -> f64 {
    5.0
}

fn default_high_value() -> f64 {
    10.0
}

fn default_critical() -> f64 {
    90.0
}

fn default_high() -> f64 {
    60.0
}

fn default_medium() -> f64 {
    30.0
}

fn default_stablecoins() -> BTreeSet<String> {
    ["USDT", "USDC", "DAI", "BUSD", "TUSD"]
        .into_iter()
        .map(String::from)
        .collect()
}
