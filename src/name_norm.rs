use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_OVERRIDES: [(&str, &str); 7] = [
    ("Manuel Ugarte Ribeiro", "Manuel Ugarte"),
    ("Igor Júlio", "Igor"),
    ("Igor Thiago", "Thiago"),
    ("Felipe Morato", "Morato"),
    ("Nathan Wood-Gordon", "Nathan Wood"),
    ("Bobby Reid", "Bobby Cordova-Reid"),
    ("J. Philogene", "Jaden Philogene Bidace"),
];

pub const DEFAULT_TRUNCATE_MIN_TOKENS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameOverrides(HashMap<String, String>);

impl NameOverrides {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self(
            BUILTIN_OVERRIDES
                .iter()
                .map(|(raw, norm)| (raw.to_string(), norm.to_string()))
                .collect(),
        )
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse name overrides json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read name overrides {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn insert(&mut self, raw: &str, normalized: &str) {
        self.0.insert(raw.to_string(), normalized.to_string());
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.0.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationRule {
    FirstLast,
    FirstTwo,
}

/// Reduces display names to a short comparable form.
///
/// Case is preserved here; folding happens in the scorer so the same output
/// can be shown to humans.
#[derive(Debug, Clone, PartialEq)]
pub struct NameNormalizer {
    overrides: NameOverrides,
    rule: TruncationRule,
    min_tokens: usize,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::first_last(NameOverrides::builtin())
    }
}

impl NameNormalizer {
    pub fn new(overrides: NameOverrides, rule: TruncationRule, min_tokens: usize) -> Self {
        Self {
            overrides,
            rule,
            min_tokens: min_tokens.max(2),
        }
    }

    pub fn first_last(overrides: NameOverrides) -> Self {
        Self::new(overrides, TruncationRule::FirstLast, DEFAULT_TRUNCATE_MIN_TOKENS)
    }

    pub fn first_two() -> Self {
        Self::new(NameOverrides::empty(), TruncationRule::FirstTwo, 2)
    }

    pub fn rule(&self) -> TruncationRule {
        self.rule
    }

    pub fn min_tokens(&self) -> usize {
        self.min_tokens
    }

    pub fn overrides(&self) -> &NameOverrides {
        &self.overrides
    }

    pub fn normalize(&self, raw: &str) -> String {
        if let Some(fixed) = self.overrides.get(raw) {
            return fixed.to_string();
        }
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() >= self.min_tokens {
            return match self.rule {
                TruncationRule::FirstLast => format!("{} {}", tokens[0], tokens[tokens.len() - 1]),
                TruncationRule::FirstTwo => format!("{} {}", tokens[0], tokens[1]),
            };
        }
        tokens.join(" ")
    }

    pub fn normalize_opt(&self, raw: Option<&str>) -> String {
        raw.map(|name| self.normalize(name)).unwrap_or_default()
    }
}
