//! # csm-risk: Transaction Risk Scoring
//!
//! Turns screening evidence into an auditable score: every contributing
//! factor is kept with its raw value, weight and contribution.
//!
//! - [`ScoringConfig`]: weights, tier thresholds, stablecoin watch set.
//! - [`ContextFactors`]: corridor, stablecoin and anomaly inputs from the
//!   caller.
//! - [`RiskScorer`]: produces an immutable [`RiskScore`].
//! - [`RiskTier`]: LOW, MEDIUM, HIGH, CRITICAL.

pub mod config;
pub mod context;
pub mod factor;
pub mod scorer;
pub mod tier;

pub use config::{FactorWeights, ScoringConfig, TierThresholds, MAX_SCORE};
pub use context::{AnomalyFlag, AnomalyKind, ContextFactors, CorridorFlag};
pub use factor::{FactorKind, RiskFactor};
pub use scorer::{RiskScore, RiskScorer};
pub use tier::RiskTier;
