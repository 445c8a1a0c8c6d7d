//! # Alert Lifecycle State Machine
//!
//! ## States
//!
//! ```text
//! New ──▶ UnderReview ──▶ Confirmed ──▶ Closed (terminal)
//!              │
//!              └──▶ Dismissed (terminal)
//! ```
//!
//! Every accepted event appends a transition record. Anything outside the
//! table is rejected with [`CsmError::InvalidTransition`] and leaves the
//! alert untouched.

use serde::{Deserialize, Serialize};

use csm_core::{AlertId, CsmError, ScoreId, Timestamp, WatchlistVersion};
use csm_risk::{RiskFactor, RiskScore, RiskTier};

// ─── Alert State ─────────────────────────────────────────────────────

/// The lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    /// Raised, not yet picked up.
    New,
    /// An analyst is investigating.
    UnderReview,
    /// Confirmed as a true positive.
    Confirmed,
    /// Dismissed as a false positive (terminal).
    Dismissed,
    /// Confirmed and closed out (terminal).
    Closed,
}

impl AlertState {
    /// Whether no further events are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dismissed | Self::Closed)
    }

    /// Whether review reached a verdict.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Dismissed | Self::Closed)
    }

    /// Target state for `event`, or `None` if the table has no such edge.
    pub fn next(&self, event: AlertEvent) -> Option<AlertState> {
        match (self, event) {
            (Self::New, AlertEvent::StartReview) => Some(Self::UnderReview),
            (Self::UnderReview, AlertEvent::Confirm) => Some(Self::Confirmed),
            (Self::UnderReview, AlertEvent::Dismiss) => Some(Self::Dismissed),
            (Self::Confirmed, AlertEvent::Close) => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Confirmed => "CONFIRMED",
            Self::Dismissed => "DISMISSED",
            Self::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NEW" => Ok(Self::New),
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "CONFIRMED" => Ok(Self::Confirmed),
            "DISMISSED" => Ok(Self::Dismissed),
            "CLOSED" => Ok(Self::Closed),
            other => Err(format!("unknown alert state {other:?}")),
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────

/// Analyst actions that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertEvent {
    /// NEW → UNDER_REVIEW.
    StartReview,
    /// UNDER_REVIEW → CONFIRMED.
    Confirm,
    /// UNDER_REVIEW → DISMISSED.
    Dismiss,
    /// CONFIRMED → CLOSED.
    Close,
}

impl std::fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StartReview => "START_REVIEW",
            Self::Confirm => "CONFIRM",
            Self::Dismiss => "DISMISS",
            Self::Close => "CLOSE",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for AlertEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "START_REVIEW" | "REVIEW" => Ok(Self::StartReview),
            "CONFIRM" => Ok(Self::Confirm),
            "DISMISS" => Ok(Self::Dismiss),
            "CLOSE" => Ok(Self::Close),
            other => Err(format!("unknown alert event {other:?}")),
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// Idempotency key: one alert per (transaction, designated address,
/// watchlist version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    /// Transaction hash in key form.
    pub transaction_hash: String,
    /// Normalized designated address, when the score named one.
    pub designated_address: Option<String>,
    /// Watchlist version of the score.
    pub watchlist_version: WatchlistVersion,
}

impl AlertKey {
    /// Key for `score`.
    pub fn for_score(score: &RiskScore) -> Self {
        Self {
            transaction_hash: score.transaction_hash.clone(),
            designated_address: score.designated_address.as_ref().map(|a| a.as_str().to_string()),
            watchlist_version: score.watchlist_version.clone(),
        }
    }
}

/// Record of an alert state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTransitionRecord {
    /// State before the transition.
    pub from_state: AlertState,
    /// State after the transition.
    pub to_state: AlertState,
    /// Event applied.
    pub event: AlertEvent,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Analyst note.
    pub note: String,
}

// ─── Alert ───────────────────────────────────────────────────────────

/// A threshold breach under review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier.
    pub alert_id: AlertId,
    /// Idempotency key.
    pub key: AlertKey,
    /// Tier of the triggering score.
    pub severity: RiskTier,
    /// Factors of the triggering score.
    pub rationale: Vec<RiskFactor>,
    /// Total of the triggering score.
    pub score_total: f64,
    /// Id of the triggering score.
    pub score_id: ScoreId,
    /// Current lifecycle state.
    pub state: AlertState,
    /// When the alert was raised.
    pub created_at: Timestamp,
    /// Last transition time.
    pub updated_at: Timestamp,
    /// Ordered log of all state transitions.
    pub transitions: Vec<AlertTransitionRecord>,
}

impl Alert {
    /// New alert for `score`. Callers check the tier first.
    pub(crate) fn from_score(score: &RiskScore) -> Self {
        let now = Timestamp::now();
        Self {
            alert_id: AlertId::new(),
            key: AlertKey::for_score(score),
            severity: score.tier,
            rationale: score.factors.clone(),
            score_total: score.total,
            score_id: score.score_id,
            state: AlertState::New,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// Apply `event`, recording the transition.
    pub fn apply(&mut self, event: AlertEvent, note: &str) -> Result<AlertState, CsmError> {
        let to = self.state.next(event).ok_or_else(|| CsmError::InvalidTransition {
            alert_id: self.alert_id.to_string(),
            from: self.state.to_string(),
            event: event.to_string(),
        })?;
        self.do_transition(to, event, note);
        Ok(to)
    }

    fn do_transition(&mut self, to: AlertState, event: AlertEvent, note: &str) {
        let now = Timestamp::now();
        self.transitions.push(AlertTransitionRecord {
            from_state: self.state,
            to_state: to,
            event,
            timestamp: now,
            note: note.to_string(),
        });
        self.state = to;
        self.updated_at = now;
    }
}
