use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn arg_path(args: &[String], flag: &str) -> Option<PathBuf> {
    arg_value(args, flag).map(PathBuf::from)
}

pub fn required_path(args: &[String], flag: &str) -> Result<PathBuf> {
    arg_path(args, flag).with_context(|| format!("missing required {flag} <path>"))
}

pub fn arg_threshold(args: &[String]) -> Result<Option<u8>> {
    let Some(raw) = arg_value(args, "--threshold") else {
        return Ok(None);
    };
    let value = raw
        .parse::<u32>()
        .with_context(|| format!("invalid --threshold '{raw}'"))?;
    Ok(Some(value.min(100) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn both_flag_forms_are_read() {
        let a = args(&["--roster", "r.csv", "--listing=l.csv", "--out", "--threshold", "85"]);
        assert_eq!(arg_value(&a, "--roster").as_deref(), Some("r.csv"));
        assert_eq!(arg_value(&a, "--listing").as_deref(), Some("l.csv"));
        assert_eq!(arg_value(&a, "--out"), None);
        assert_eq!(arg_threshold(&a).expect("threshold"), Some(85));
    }

    #[test]
    fn threshold_above_scale_is_clamped() {
        assert_eq!(arg_threshold(&args(&["--threshold", "300"])).expect("threshold"), Some(100));
        assert_eq!(arg_threshold(&args(&["--threshold=100"])).expect("threshold"), Some(100));
    }

    #[test]
    fn bad_threshold_is_an_error() {
        let a = args(&["--threshold", "high"]);
        assert!(arg_threshold(&a).is_err());
        assert!(required_path(&a, "--roster").is_err());
    }
}
