//! # Stats Subcommand
//!
//! Loads a watchlist file and prints index statistics.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::input::{build_engine, load_watchlist, print_json};

/// Arguments for the `csm stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Watchlist JSON file.
    #[arg(long, short, value_name = "WATCHLIST_JSON")]
    pub watchlist: PathBuf,

    /// Print JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Execute the stats subcommand.
pub fn run_stats(args: &StatsArgs, config: Option<&Path>) -> Result<u8> {
    let engine = build_engine(config)?;
    let report = load_watchlist(&engine, &args.watchlist)?;
    let stats = engine.watchlist_stats()?;

    if args.json {
        print_json(&stats)?;
        return Ok(0);
    }

    println!("Watchlist {} ({})", stats.version, stats.fingerprint);
    println!("  built at:          {}", stats.built_at);
    println!("  entries:           {}", stats.entries);
    println!("  addresses:         {}", stats.addresses);
    println!("  IRGC-linked:       {}", stats.irgc_linked);
    println!("  exchanges:         {}", stats.exchanges);
    println!("  skipped records:   {}", report.skipped_records.len());
    println!("  skipped addresses: {}", report.skipped_addresses.len());
    println!("  filtered records:  {}", report.filtered_records);
    println!("By chain:");
    for (chain, count) in &stats.addresses_by_chain {
        println!("  {:<10} {count}", chain.to_string());
    }
    println!("By program:");
    for (program, count) in &stats.entries_by_program {
        println!("  {program:<10} {count}");
    }
    println!("By entity type:");
    for (kind, count) in &stats.entries_by_type {
        println!("  {:<12} {count}", kind.to_string());
    }
    Ok(0)
}
