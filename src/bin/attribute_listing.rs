use anyhow::Result;

use player_fee_link::cli::{arg_path, arg_threshold, arg_value, init_tracing, required_path};
use player_fee_link::config::LinkConfig;
use player_fee_link::pipeline::{self, Stage};
use player_fee_link::roles::Role;
use player_fee_link::table_io;

fn main() -> Result<()> {
    init_tracing();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = LinkConfig::from_env();

    let roster = table_io::read_roster(&required_path(&args, "--roster")?)?;
    let listing = table_io::read_listing(&required_path(&args, "--listing")?)?;
    let stage = match arg_value(&args, "--stage") {
        Some(raw) => raw.parse::<Stage>()?,
        None => Stage::Valuations,
    };
    let attribution =
        pipeline::run_attribution(stage, &cfg, &roster.players, &listing, arg_threshold(&args)?)?;

    let ordered = attribution.output_rows();
    if let Some(path) = arg_path(&args, "--out") {
        table_io::write_attribution(table_io::create_output(&path)?, &ordered)?;
        println!("Output: {}", path.display());
    }

    let by_role = attribution.by_role();
    let count = |role: Role| by_role.get(&role).map(Vec::len).unwrap_or(0);
    println!("Attribution complete ({stage})");
    println!(
        "Attributed: {} (GK: {}, DF: {}, MF: {}, FW: {})",
        ordered.len(),
        count(Role::Goalkeeper),
        count(Role::Defender),
        count(Role::Midfielder),
        count(Role::Forward)
    );
    if !attribution.unmatched.is_empty() {
        println!("Unmatched listing rows: {}", attribution.unmatched.len());
    }
    Ok(())
}
