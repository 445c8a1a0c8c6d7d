//! Caller-supplied context factors.
//!
//! These are computed outside the engine by analytics collaborators and
//! passed in per transaction. The scorer only checks whether they are
//! present; it never derives them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A jurisdictional risk indicator attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorridorFlag {
    /// Short code, e.g. an ISO country code or corridor label.
    pub code: String,
    /// Free-text explanation.
    #[serde(default)]
    pub description: String,
}

/// Kind of statistical outlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Unusual transaction frequency.
    Velocity,
    /// Unusual amount.
    Volume,
}

/// A velocity or volume outlier flagged by an external model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    /// Outlier kind.
    pub kind: AnomalyKind,
    /// Free-text explanation.
    #[serde(default)]
    pub detail: String,
}

/// Everything the caller knows about a transaction beyond the chain data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextFactors {
    /// Jurisdictional flags on the counterparties.
    pub corridor_flags: Vec<CorridorFlag>,
    /// Stablecoin symbols to watch. `None` defers to the scoring config;
    /// an empty set disables the factor.
    pub stablecoin_watch_set: Option<BTreeSet<String>>,
    /// Statistical outliers.
    pub anomalies: Vec<AnomalyFlag>,
}

impl ContextFactors {
    /// Context with one corridor flag.
    pub fn with_corridor(mut self, code: impl Into<String>) -> Self {
        self.corridor_flags.push(CorridorFlag {
            code: code.into(),
            description: String::new(),
        });
        self
    }

    /// Context with one anomaly.
    pub fn with_anomaly(mut self, kind: AnomalyKind) -> Self {
        self.anomalies.push(AnomalyFlag {
            kind,
            detail: String::new(),
        });
        self
    }
}
