//! # Input Files
//!
//! File formats shared by the subcommands.
//!
//! Watchlist file (JSON):
//!
//! ```json
//! {
//!   "version": "ofac-2026-01-15",
//!   "records": [
//!     {"uid": "36512", "name": "...", "sdn_type": "Entity", "programs": ["IRGC"],
//!      "addresses": [{"id_type": "Digital Currency Address - ETH", "address": "0x..."}]}
//!   ]
//! }
//! ```
//!
//! Transaction files hold either one transaction object or an array of
//! them. Context files hold one `ContextFactors` object.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use csm_core::{Transaction, WatchlistVersion};
use csm_engine::{EngineConfig, ScreeningEngine};
use csm_risk::ContextFactors;
use csm_watchlist::{IngestReport, RawSanctionsRecord};

/// A versioned raw sanctions list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistFile {
    /// Version label for the built index.
    pub version: String,
    /// Raw records.
    #[serde(default)]
    pub records: Vec<RawSanctionsRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Build an engine from the optional YAML config.
pub fn build_engine(config: Option<&Path>) -> Result<ScreeningEngine> {
    let config = match config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(ScreeningEngine::new(config)?)
}

/// Load a watchlist file into `engine`.
pub fn load_watchlist(engine: &ScreeningEngine, path: &Path) -> Result<IngestReport> {
    let file: WatchlistFile = read_json(path)?;
    let version = WatchlistVersion::new(file.version.as_str())
        .with_context(|| format!("bad version in {}", path.display()))?;
    let report = engine.refresh_watchlist(version, file.records);
    for skipped in &report.skipped_records {
        tracing::warn!(uid = %skipped.uid, reason = %skipped.reason, "record skipped");
    }
    Ok(report)
}

/// Load one transaction or an array of transactions.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    Ok(match read_json::<OneOrMany<Transaction>>(path)? {
        OneOrMany::One(tx) => vec![tx],
        OneOrMany::Many(txs) => txs,
    })
}

/// Load caller context, or the empty context when no file is given.
pub fn load_context(path: Option<&Path>) -> Result<ContextFactors> {
    match path {
        Some(p) => read_json(p),
        None => Ok(ContextFactors::default()),
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const TX: &str = r#"{
        "chain": "ethereum",
        "hash": "0xfeed",
        "timestamp": "2026-01-15T12:00:00Z",
        "participants": [
            {"address": "0x0000000000000000000000000000000000000100", "role": "sender"},
            {"address": "0x8589427373d6d84e98730d7795d8f6f8731fda16", "role": "receiver"}
        ],
        "amount": "50000",
        "asset": "USDT"
    }"#;

    #[test]
    fn test_single_and_array_transactions() {
        let dir = tempfile::tempdir().unwrap();
        let one = write(&dir, "one.json", TX);
        let many = write(&dir, "many.json", &format!("[{TX},{TX}]"));
        assert_eq!(load_transactions(&one).unwrap().len(), 1);
        assert_eq!(load_transactions(&many).unwrap().len(), 2);
    }

    #[test]
    fn test_watchlist_file_loads_into_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "watchlist.json",
            r#"{
                "version": "ofac-2026-01-15",
                "records": [
                    {"uid": "1", "name": "Front Co", "sdn_type": "Entity", "programs": ["IRGC"],
                     "addresses": [{"id_type": "Digital Currency Address - ETH",
                                    "address": "0x8589427373D6D84E98730D7795D8f6f8731FDA16"}]},
                    {"uid": "2", "name": "", "programs": ["IRGC"]}
                ]
            }"#,
        );
        let engine = build_engine(None).unwrap();
        let report = load_watchlist(&engine, &path).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.skipped_records.len(), 1);
        assert_eq!(engine.watchlist_version().unwrap().as_str(), "ofac-2026-01-15");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_transactions(Path::new("/nonexistent/tx.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/tx.json"));
    }

    #[test]
    fn test_context_defaults_when_absent() {
        assert_eq!(load_context(None).unwrap(), ContextFactors::default());
    }

    #[test]
    fn test_config_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "csm.yaml", "batch:\n  workers: 2\n");
        let engine = build_engine(Some(&path)).unwrap();
        assert_eq!(engine.config().batch.workers, 2);
    }

    #[test]
    fn test_missing_config_reports_path() {
        let err = build_engine(Some(Path::new("/nonexistent/csm.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/csm.yaml"));
    }
}
