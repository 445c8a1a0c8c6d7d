//! # csm-cli: Command-Line Interface
//!
//! Provides the `csm` binary over the screening engine.
//!
//! ## Subcommands
//!
//! - `csm stats`: Watchlist statistics.
//! - `csm screen`: Screen one address.
//! - `csm score`: Score a transaction file, print scores and alerts.
//!
//! ```bash
//! csm stats -w sdn.json
//! csm screen -w sdn.json -c eth 0x8589427373D6D84E98730D7795D8f6f8731FDA16
//! csm --config csm.yaml score -w sdn.json txs.json --history window.json
//! ```

pub mod input;
pub mod score;
pub mod screen;
pub mod stats;
