use std::path::PathBuf;

use anyhow::{Context, Result};

use player_fee_link::cli::{arg_path, arg_threshold, arg_value, init_tracing, required_path};
use player_fee_link::config::LinkConfig;
use player_fee_link::export;
use player_fee_link::pipeline::{self, Stage};
use player_fee_link::table_io;

const USAGE: &str = "usage: player_fee_link --roster <csv> --listing <csv> \
[--stage transfers|valuations|roles] [--threshold N] [--out <csv>] [--unmatched <txt>] [--xlsx <path>]";

fn main() -> Result<()> {
    init_tracing();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let cfg = LinkConfig::from_env();
    let roster_path = required_path(&args, "--roster").context(USAGE)?;
    let listing_path = required_path(&args, "--listing").context(USAGE)?;
    let stage = match arg_value(&args, "--stage") {
        Some(raw) => raw.parse::<Stage>()?,
        None => Stage::Valuations,
    };
    let threshold = arg_threshold(&args)?;

    let roster = table_io::read_roster(&roster_path)?;
    let listing = table_io::read_listing(&listing_path)?;
    let result = pipeline::run_reconcile(stage, &cfg, &roster.players, &listing, threshold)?;

    let out_path = arg_path(&args, "--out").unwrap_or_else(|| default_out(&roster_path, stage));
    table_io::write_enriched_csv(&out_path, &roster.headers, &result.enriched)?;
    if let Some(path) = arg_path(&args, "--unmatched") {
        table_io::write_unmatched(&path, &result.unmatched)?;
    }
    if let Some(path) = arg_path(&args, "--xlsx") {
        let report = export::export_reconciliation(&path, &stage.to_string(), &roster.headers, &result)?;
        println!(
            "Workbook: {} ({} rows, {} unmatched)",
            path.display(),
            report.enriched_rows,
            report.unmatched_rows
        );
    }

    println!("Reconciliation complete ({stage})");
    println!("Roster rows: {}", result.enriched.len());
    println!("Listing rows: {}", listing.len());
    println!("Matched: {}", result.matched_count());
    println!("Output: {}", out_path.display());
    if !result.unmatched.is_empty() {
        println!("Unmatched: {}", result.unmatched.len());
        for name in result.unmatched.iter().take(8) {
            println!(" - {name}");
        }
    }
    Ok(())
}

fn default_out(roster_path: &std::path::Path, stage: Stage) -> PathBuf {
    roster_path.with_file_name(format!("enriched_{stage}.csv"))
}
