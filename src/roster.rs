use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalPlayer {
    pub name: String,
    pub team: String,
    pub position: String,
    pub minutes: f64,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl CanonicalPlayer {
    pub fn new(name: &str, position: &str, minutes: f64) -> Self {
        Self {
            name: name.to_string(),
            position: position.to_string(),
            minutes,
            ..Self::default()
        }
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = team.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub position: Option<String>,
}

impl ExternalRecord {
    pub fn new(name: &str, price: &str) -> Self {
        Self {
            name: name.to_string(),
            price: price.to_string(),
            position: None,
        }
    }
}

pub trait Named {
    fn display_name(&self) -> &str;
}

impl Named for CanonicalPlayer {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Named for ExternalRecord {
    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Turns a scraped stats-table name into "First Last" display form.
///
/// `"Palmer, Cole"` becomes `"Cole Palmer"`; other names only have their
/// whitespace collapsed. Blank and `N/A` cells yield `None`.
pub fn format_display_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "N/A" {
        return None;
    }
    if trimmed.contains(',') {
        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let joined = parts
            .iter()
            .rev()
            .flat_map(|part| part.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        return non_empty(joined);
    }
    non_empty(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

pub fn dedupe_roster(players: Vec<CanonicalPlayer>) -> Vec<CanonicalPlayer> {
    let mut seen: HashSet<String> = HashSet::new();
    players
        .into_iter()
        .filter(|p| !p.name.trim().is_empty())
        .filter(|p| seen.insert(p.name.clone()))
        .collect()
}

pub fn filter_min_minutes(players: &[CanonicalPlayer], min_minutes: f64) -> Vec<CanonicalPlayer> {
    players
        .iter()
        .filter(|p| p.minutes > min_minutes)
        .cloned()
        .collect()
}
