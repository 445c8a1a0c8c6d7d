//! Scoring factors.
//!
//! A factor records why it fired, how strongly, and what it added to the
//! total, so a score can always be explained after the fact.

use serde::{Deserialize, Serialize};

/// The kinds of evidence the scorer weighs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// A participant is a designated address.
    DirectMatch,
    /// A participant is within edit distance of a designated address.
    NearMatch,
    /// A designated address sits one or more counterparty hops away.
    Proximity,
    /// The caller flagged the payment corridor.
    CorridorFlag,
    /// The asset is a watched stablecoin.
    StablecoinUsage,
    /// The caller reported a velocity or volume anomaly.
    VelocityAnomaly,
    /// A participant failed address validation.
    MalformedAddress,
    /// USD value at or above the configured threshold.
    HighValue,
}

impl FactorKind {
    /// Human-readable factor name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectMatch => "Direct match",
            Self::NearMatch => "Near match",
            Self::Proximity => "Proximity",
            Self::CorridorFlag => "Corridor flag",
            Self::StablecoinUsage => "Stablecoin usage",
            Self::VelocityAnomaly => "Velocity/volume anomaly",
            Self::MalformedAddress => "Malformed address",
            Self::HighValue => "High value",
        }
    }
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One triggered factor and its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor kind.
    pub kind: FactorKind,
    /// Display name.
    pub name: String,
    /// The underlying measurement: a count, an edit distance, a hop count,
    /// or a USD amount depending on the kind.
    pub raw_value: f64,
    /// Raw value mapped onto 0.0..=1.0.
    pub normalized_value: f64,
    /// Configured weight.
    pub weight: f64,
    /// `weight * normalized_value`.
    pub contribution: f64,
    /// What triggered it.
    pub detail: String,
}

impl RiskFactor {
    pub(crate) fn new(
        kind: FactorKind,
        raw_value: f64,
        normalized_value: f64,
        weight: f64,
        detail: String,
    ) -> Self {
        let normalized_value = normalized_value.clamp(0.0, 1.0);
        Self {
            kind,
            name: kind.label().to_string(),
            raw_value,
            normalized_value,
            weight,
            contribution: weight * normalized_value,
            detail,
        }
    }
}
