//! # Engine Configuration
//!
//! One YAML document groups every tunable. Every field has a default, so an
//! empty file is a valid configuration:
//!
//! ```yaml
//! matching:
//!   near_max_distance: 1
//! proximity:
//!   max_hops: 2
//!   max_nodes: 10000
//! scoring:
//!   weights:
//!     corridor_flag: 30
//!   tiers:
//!     critical: 90
//!     high: 60
//!     medium: 30
//!   high_value_threshold_usd: 10000
//! ingest:
//!   program_filter: [IRGC, CYBER]
//! batch:
//!   workers: 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use csm_core::CsmError;
use csm_graph::{ProximityBounds, MAX_HOPS_LIMIT};
use csm_risk::ScoringConfig;
use csm_watchlist::{IngestConfig, Matcher, MAX_NEAR_DISTANCE};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Address matching.
    pub matching: MatchingConfig,
    /// Graph traversal budget.
    pub proximity: ProximityBounds,
    /// Weights and tiers.
    pub scoring: ScoringConfig,
    /// Watchlist ingestion.
    pub ingest: IngestConfig,
    /// Batch scoring.
    pub batch: BatchConfig,
}

/// Address matching settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Largest edit distance reported as a near match. 0 disables near
    /// matching.
    #[serde(default = "default_near_max_distance")]
    pub near_max_distance: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            near_max_distance: default_near_max_distance(),
        }
    }
}

/// Batch scoring settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads per batch.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

// Default value functions for serde
fn default_near_max_distance() -> u8 {
    Matcher::DEFAULT_NEAR_THRESHOLD
}

fn default_workers() -> usize {
    4
}

impl EngineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CsmError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CsmError::Config(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, CsmError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| CsmError::Config(format!("invalid engine config {}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Check ranges across all groups.
    pub fn validate(&self) -> Result<(), CsmError> {
        if self.matching.near_max_distance > MAX_NEAR_DISTANCE {
            return Err(CsmError::Config(format!(
                "matching.near_max_distance must be at most {MAX_NEAR_DISTANCE}, got {}",
                self.matching.near_max_distance
            )));
        }
        if self.proximity.max_hops > MAX_HOPS_LIMIT {
            return Err(CsmError::Config(format!(
                "proximity.max_hops must be at most {MAX_HOPS_LIMIT}, got {}",
                self.proximity.max_hops
            )));
        }
        if self.proximity.max_nodes == 0 {
            return Err(CsmError::Config("proximity.max_nodes must be positive".into()));
        }
        if self.batch.workers == 0 {
            return Err(CsmError::Config("batch.workers must be positive".into()));
        }
        self.scoring.validate()
    }
}
