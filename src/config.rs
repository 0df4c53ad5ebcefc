use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::name_norm::{DEFAULT_TRUNCATE_MIN_TOKENS, NameNormalizer, NameOverrides, TruncationRule};

pub const DEFAULT_THRESHOLD_TRANSFERS: u8 = 80;
pub const DEFAULT_THRESHOLD_VALUATIONS: u8 = 70;
pub const DEFAULT_THRESHOLD_ROLES: u8 = 90;
pub const DEFAULT_MIN_MINUTES: f64 = 900.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    pub threshold_transfers: u8,
    pub threshold_valuations: u8,
    pub threshold_roles: u8,
    pub min_minutes: f64,
    pub truncate_min_tokens: usize,
    pub overrides_path: Option<PathBuf>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            threshold_transfers: DEFAULT_THRESHOLD_TRANSFERS,
            threshold_valuations: DEFAULT_THRESHOLD_VALUATIONS,
            threshold_roles: DEFAULT_THRESHOLD_ROLES,
            min_minutes: DEFAULT_MIN_MINUTES,
            truncate_min_tokens: DEFAULT_TRUNCATE_MIN_TOKENS,
            overrides_path: None,
        }
    }
}

impl LinkConfig {
    pub fn from_env() -> Self {
        for file in [".env.local", ".env"] {
            if let Ok(path) = dotenvy::from_filename(file) {
                debug!(path = %path.display(), "loaded env file");
            }
        }
        Self {
            threshold_transfers: env_threshold("LINK_THRESHOLD_TRANSFERS", DEFAULT_THRESHOLD_TRANSFERS),
            threshold_valuations: env_threshold("LINK_THRESHOLD_VALUATIONS", DEFAULT_THRESHOLD_VALUATIONS),
            threshold_roles: env_threshold("LINK_THRESHOLD_ROLES", DEFAULT_THRESHOLD_ROLES),
            min_minutes: env::var("LINK_MIN_MINUTES")
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(DEFAULT_MIN_MINUTES)
                .max(0.0),
            truncate_min_tokens: env::var("LINK_TRUNCATE_MIN_TOKENS")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_TRUNCATE_MIN_TOKENS)
                .clamp(2, 8),
            overrides_path: opt_env("LINK_OVERRIDES_PATH").map(PathBuf::from),
        }
    }

    pub fn overrides(&self) -> Result<NameOverrides> {
        match self.overrides_path.as_ref() {
            Some(path) => NameOverrides::load(path),
            None => Ok(NameOverrides::builtin()),
        }
    }

    pub fn valuation_normalizer(&self) -> Result<NameNormalizer> {
        Ok(NameNormalizer::new(
            self.overrides()?,
            TruncationRule::FirstLast,
            self.truncate_min_tokens,
        ))
    }
}

fn env_threshold(key: &str, default: u8) -> u8 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default as u32)
        .min(100) as u8
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}
