//! # Alert Manager
//!
//! In-memory alert store backed by `DashMap`.
//!
//! `raise` is a compare-and-create on the idempotency key: the key map's
//! entry lock is held while the alert is inserted, so concurrent raises for
//! one key produce one alert. Alerts are never removed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use csm_core::{AlertId, CsmError, Timestamp};
use csm_risk::{RiskScore, RiskTier};

use crate::alert::{Alert, AlertEvent, AlertKey, AlertState};

/// Listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    /// Only alerts in this state.
    pub state: Option<AlertState>,
    /// Only alerts of this severity.
    pub severity: Option<RiskTier>,
    /// Raised at or after.
    pub created_after: Option<Timestamp>,
    /// Raised strictly before.
    pub created_before: Option<Timestamp>,
}

impl AlertFilter {
    /// Whether `alert` passes the filter.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.state.map_or(true, |s| alert.state == s)
            && self.severity.map_or(true, |s| alert.severity == s)
            && self.created_after.map_or(true, |t| alert.created_at >= t)
            && self.created_before.map_or(true, |t| alert.created_at < t)
    }
}

/// Thread-safe alert manager.
pub struct AlertManager {
    alerts: DashMap<AlertId, Alert>,
    by_key: DashMap<AlertKey, AlertId>,
}

impl AlertManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            alerts: DashMap::new(),
            by_key: DashMap::new(),
        }
    }

    /// Raise an alert for `score`, or return the existing one for its key
    /// unchanged.
    ///
    /// Fails with [`CsmError::NotAlertable`] below HIGH.
    pub fn raise(&self, score: &RiskScore) -> Result<Alert, CsmError> {
        if !score.tier.is_alertable() {
            return Err(CsmError::NotAlertable {
                score_id: score.score_id.to_string(),
                tier: score.tier.to_string(),
            });
        }

        match self.by_key.entry(AlertKey::for_score(score)) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                tracing::debug!(alert_id = %id, score_id = %score.score_id, "alert already raised for key");
                self.alerts
                    .get(&id)
                    .map(|a| a.value().clone())
                    .ok_or_else(|| CsmError::AlertNotFound(id.to_string()))
            }
            Entry::Vacant(slot) => {
                let alert = Alert::from_score(score);
                tracing::info!(
                    alert_id = %alert.alert_id,
                    tx = %alert.key.transaction_hash,
                    severity = %alert.severity,
                    watchlist_version = %alert.key.watchlist_version,
                    "alert raised"
                );
                self.alerts.insert(alert.alert_id, alert.clone());
                slot.insert(alert.alert_id);
                Ok(alert)
            }
        }
    }

    /// Apply `event` to an alert.
    pub fn transition(&self, alert_id: &AlertId, event: AlertEvent, note: &str) -> Result<Alert, CsmError> {
        let mut entry = self
            .alerts
            .get_mut(alert_id)
            .ok_or_else(|| CsmError::AlertNotFound(alert_id.to_string()))?;
        let alert = entry.value_mut();
        let from = alert.state;
        alert.apply(event, note)?;
        tracing::info!(
            alert_id = %alert.alert_id,
            from = %from,
            to = %alert.state,
            event = %event,
            "alert transitioned"
        );
        Ok(alert.clone())
    }

    /// Look up one alert.
    pub fn get(&self, alert_id: &AlertId) -> Option<Alert> {
        self.alerts.get(alert_id).map(|a| a.value().clone())
    }

    /// Alerts passing `filter`, oldest first.
    pub fn list(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut out: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| filter.matches(a.value()))
            .map(|a| a.value().clone())
            .collect();
        out.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.transaction_hash.cmp(&b.key.transaction_hash))
                .then_with(|| a.alert_id.cmp(&b.alert_id))
        });
        out
    }

    /// Number of alerts ever raised.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether no alert has been raised.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("alert_count", &self.alerts.len())
            .finish()
    }
}
