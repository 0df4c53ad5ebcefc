use std::fs;

use anyhow::{Context, Result};

use player_fee_link::cli::{arg_value, init_tracing, required_path};
use player_fee_link::fetch::{HttpFetcher, RetryPolicy, fetch_with_retry, page_urls};

/// Saves raw listing pages as `page_<n>.html` for offline table extraction.
fn main() -> Result<()> {
    init_tracing();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let base = arg_value(&args, "--base").context("missing required --base <url>")?;
    let pages = arg_value(&args, "--pages")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1)
        .clamp(1, 100);
    let out_dir = required_path(&args, "--out-dir")?;
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let fetcher = HttpFetcher;
    let mut errors = Vec::new();
    let mut saved = 0usize;
    for (idx, url) in page_urls(&base, pages).iter().enumerate() {
        match fetch_with_retry(&fetcher, url, RetryPolicy::default()) {
            Ok(body) => {
                let path = out_dir.join(format!("page_{}.html", idx + 1));
                fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
                saved += 1;
            }
            Err(err) => errors.push(format!("{err:#}")),
        }
    }

    println!("Pages saved: {saved}/{pages}");
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    Ok(())
}
