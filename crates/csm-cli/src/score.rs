//! # Score Subcommand
//!
//! Scores every transaction in a file against a watchlist and prints the
//! scores and any raised alerts as JSON.
//!
//! The counterparty graph for proximity is built from the scored
//! transactions plus an optional history file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use csm_alert::Alert;
use csm_engine::TransactionContext;
use csm_graph::AdjacencyGraph;
use csm_risk::RiskScore;

use crate::input::{build_engine, load_context, load_transactions, load_watchlist, print_json};

/// Arguments for the `csm score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Watchlist JSON file.
    #[arg(long, short, value_name = "WATCHLIST_JSON")]
    pub watchlist: PathBuf,

    /// Transaction JSON file (one object or an array).
    #[arg(value_name = "TRANSACTIONS_JSON")]
    pub transactions: PathBuf,

    /// Earlier transactions that only feed the counterparty graph.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Context factors applied to every transaction.
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Exit with status 1 when any alert is raised.
    #[arg(long)]
    pub fail_on_alert: bool,
}

#[derive(Serialize)]
struct ScoreReport {
    watchlist_version: String,
    scores: Vec<RiskScore>,
    alerts: Vec<Alert>,
}

/// Execute the score subcommand.
///
/// Returns exit code: 0 normally, 1 on any alert with `--fail-on-alert`.
pub fn run_score(args: &ScoreArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(config)?;
    let report = load_watchlist(&engine, &args.watchlist)?;
    tracing::info!(entries = report.entries.len(), "watchlist loaded");

    let transactions = load_transactions(&args.transactions)?;
    let history = match &args.history {
        Some(path) => load_transactions(path)?,
        None => Vec::new(),
    };
    let factors = load_context(args.context.as_deref())?;

    let graph = AdjacencyGraph::from_transactions(transactions.iter().chain(history.iter()));
    tracing::debug!(nodes = graph.node_count(), edges = graph.edge_count(), "counterparty graph built");

    let items: Vec<_> = transactions
        .into_iter()
        .map(|tx| {
            let context = TransactionContext {
                graph: Some(&graph),
                factors: factors.clone(),
            };
            (tx, context)
        })
        .collect();
    let outcomes = engine.score_batch(&items)?;

    let mut alerts: Vec<Alert> = Vec::new();
    let mut scores = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        if let Some(alert) = outcome.alert {
            if !alerts.iter().any(|a| a.alert_id == alert.alert_id) {
                alerts.push(alert);
            }
        }
        scores.push(outcome.risk_score);
    }
    tracing::info!(scored = scores.len(), alerts = alerts.len(), "scoring complete");

    let raised = !alerts.is_empty();
    print_json(&ScoreReport {
        watchlist_version: engine
            .watchlist_version()
            .map(|v| v.to_string())
            .unwrap_or_default(),
        scores,
        alerts,
    })?;
    Ok(if args.fail_on_alert && raised { 1 } else { 0 })
}
