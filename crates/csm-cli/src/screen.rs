//! # Screen Subcommand
//!
//! Screens one address and prints the match result as JSON.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::input::{build_engine, load_watchlist, print_json};

/// Arguments for the `csm screen` subcommand.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Watchlist JSON file.
    #[arg(long, short, value_name = "WATCHLIST_JSON")]
    pub watchlist: PathBuf,

    /// Chain label: bitcoin, ethereum, tron, other_evm, or an alias such as eth.
    #[arg(long, short)]
    pub chain: String,

    /// Address to screen.
    pub address: String,

    /// Exit with status 1 on an exact or near match.
    #[arg(long)]
    pub fail_on_match: bool,
}

/// Execute the screen subcommand.
///
/// Returns exit code: 0 normally, 1 on a match with `--fail-on-match`.
pub fn run_screen(args: &ScreenArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(config)?;
    load_watchlist(&engine, &args.watchlist)?;
    let result = engine.screen_address(&args.chain, &args.address)?;
    tracing::info!(kind = %result.kind, address = %args.address, "screened");
    print_json(&result)?;
    Ok(if args.fail_on_match && result.is_match() { 1 } else { 0 })
}
