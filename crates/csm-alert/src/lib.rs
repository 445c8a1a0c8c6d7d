//! # csm-alert: Alert Lifecycle
//!
//! Scores at HIGH or CRITICAL become alerts. An alert is created once per
//! (transaction hash, designated address, watchlist version) and then only
//! moves through the lifecycle table in [`alert`]. Alerts are retained
//! forever, including dismissed and closed ones.

pub mod alert;
pub mod manager;

pub use alert::{Alert, AlertEvent, AlertKey, AlertState, AlertTransitionRecord};
pub use manager::{AlertFilter, AlertManager};
