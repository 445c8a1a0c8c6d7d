//! # csm-engine: Screening Engine
//!
//! The entry point collaborators use. It owns the published watchlist
//! snapshot and the alert manager, and exposes:
//!
//! - [`ScreeningEngine::refresh_watchlist`] / [`ScreeningEngine::load_entries`]
//! - [`ScreeningEngine::screen_address`]
//! - [`ScreeningEngine::score_transaction`] / [`ScreeningEngine::score_batch`]
//! - [`ScreeningEngine::list_alerts`] / [`ScreeningEngine::transition_alert`]
//!
//! Configuration comes from [`EngineConfig`], normally loaded from YAML.

pub mod config;
pub mod engine;

pub use config::{BatchConfig, EngineConfig, MatchingConfig};
pub use engine::{ScreeningEngine, ScreeningOutcome, TransactionContext};
