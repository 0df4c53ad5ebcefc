use anyhow::Result;

use player_fee_link::cli::{arg_path, arg_threshold, init_tracing, required_path};
use player_fee_link::config::LinkConfig;
use player_fee_link::{export, pipeline, table_io};

fn main() -> Result<()> {
    init_tracing();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = LinkConfig::from_env();

    let roster = table_io::read_roster(&required_path(&args, "--roster")?)?;
    let listing = table_io::read_listing(&required_path(&args, "--listing")?)?;
    let analysis = pipeline::run_role_analysis(&cfg, &roster.players, &listing, arg_threshold(&args)?)?;

    if let Some(path) = arg_path(&args, "--out") {
        table_io::write_role_report(table_io::create_output(&path)?, &analysis)?;
        println!("Output: {}", path.display());
    }
    if let Some(path) = arg_path(&args, "--xlsx") {
        export::export_role_analysis(&path, &analysis)?;
        println!("Workbook: {}", path.display());
    }

    println!("Role analysis complete (min minutes {})", cfg.min_minutes);
    for report in &analysis.reports {
        println!(
            "{}: {}/{} linked",
            report.role.label(),
            report.rows.len(),
            report.candidates
        );
        if let Some(fit) = report.fit {
            println!(
                "  fit: train {} test {} RMSE {:.0} R2 {:.3}",
                fit.train_rows, fit.test_rows, fit.rmse, fit.r2
            );
        }
        if !report.unmatched.is_empty() {
            println!("  unmatched: {}", report.unmatched.join(", "));
        }
    }
    Ok(())
}
