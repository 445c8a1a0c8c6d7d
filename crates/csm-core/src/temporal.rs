//! # Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. Block timestamps
//! from explorers, score generation times, and alert lifecycle records all
//! use it, so ordering and date-range filters compare like with like.
//!
//! External feeds are not consistent about offsets; [`Timestamp::parse`]
//! accepts any RFC 3339 offset and converts to UTC.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CsmError;

/// A UTC timestamp with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Wrap a `DateTime<Utc>`, dropping sub-second precision.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Parse an RFC 3339 string with any offset.
    pub fn parse(s: &str) -> Result<Self, CsmError> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|e| CsmError::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    /// From Unix seconds, as reported in block headers.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CsmError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| CsmError::InvalidTimestamp {
                input: secs.to_string(),
                reason: "out of range for a UTC timestamp".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The UTC calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}
