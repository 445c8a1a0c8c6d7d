//! # Identifier Newtypes
//!
//! Newtype wrappers so an alert id cannot be passed where a score id is
//! expected, and watchlist version labels are validated once at the edge.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CsmError;

/// Unique identifier for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

/// Unique identifier for a generated risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScoreId(pub Uuid);

impl AlertId {
    /// Generate a new random alert identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alert:{}", self.0)
    }
}

/// Accepts both `alert:<uuid>` and a bare UUID.
impl FromStr for AlertId {
    type Err = CsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix("alert:").unwrap_or(raw);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| CsmError::AlertNotFound(s.to_string()))
    }
}

impl ScoreId {
    /// Generate a new random score identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "score:{}", self.0)
    }
}

/// Label of one published sanctions list version, e.g. `sdn-2026-01-15`.
///
/// Non-empty, at most 128 characters, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WatchlistVersion(String);

impl WatchlistVersion {
    /// Validate and wrap a version label.
    pub fn new(label: impl Into<String>) -> Result<Self, CsmError> {
        let label = label.into();
        if label.is_empty() || label.len() > 128 || label.chars().any(char::is_whitespace) {
            return Err(CsmError::InvalidWatchlistVersion(label));
        }
        Ok(Self(label))
    }

    /// The label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WatchlistVersion {
    type Error = CsmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WatchlistVersion> for String {
    fn from(version: WatchlistVersion) -> Self {
        version.0
    }
}

impl std::fmt::Display for WatchlistVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
