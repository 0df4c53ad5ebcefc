use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::matcher::CandidateIndex;
use crate::name_norm::NameNormalizer;
use crate::roles::{Role, route_role};
use crate::roster::{CanonicalPlayer, ExternalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClaimPolicy {
    #[default]
    FirstClaim,
    EveryRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedListing {
    /// Output name: the roster name or the listed name, per policy.
    pub player: String,
    pub canonical: String,
    pub source_name: String,
    pub position: String,
    pub price: String,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attribution {
    pub policy: ClaimPolicy,
    pub attributed: Vec<AttributedListing>,
    pub unmatched: Vec<ExternalRecord>,
}

impl Attribution {
    pub fn by_role(&self) -> BTreeMap<Role, Vec<&AttributedListing>> {
        let mut out: BTreeMap<Role, Vec<&AttributedListing>> = BTreeMap::new();
        for row in &self.attributed {
            if let Some(role) = route_role(&row.position) {
                out.entry(role).or_default().push(row);
            }
        }
        out
    }

    pub fn ordered_by_role(&self) -> Vec<&AttributedListing> {
        self.by_role().into_values().flatten().collect()
    }

    pub fn output_rows(&self) -> Vec<&AttributedListing> {
        match self.policy {
            ClaimPolicy::FirstClaim => self.ordered_by_role(),
            ClaimPolicy::EveryRow => self.attributed.iter().collect(),
        }
    }
}

/// Matches each listing row against the roster, the reverse of
/// [`crate::reconcile::reconcile`].
pub fn attribute_listing(
    listing: &[ExternalRecord],
    roster: &[CanonicalPlayer],
    normalizer: &NameNormalizer,
    threshold: u8,
    policy: ClaimPolicy,
) -> Attribution {
    let index = CandidateIndex::build(roster, normalizer);
    let mut out = Attribution {
        policy,
        ..Attribution::default()
    };
    let mut claimed: HashSet<String> = HashSet::new();

    for record in listing {
        let Some(m) = index.match_one(&record.name).filter(|m| m.accepted(threshold)) else {
            out.unmatched.push(record.clone());
            continue;
        };
        debug!(source = %record.name, player = %m.record.name, score = m.score, "attributed");
        if policy == ClaimPolicy::FirstClaim && !claimed.insert(m.record.name.clone()) {
            continue;
        }
        let player = match policy {
            ClaimPolicy::FirstClaim => m.record.name.clone(),
            ClaimPolicy::EveryRow => record.name.clone(),
        };
        out.attributed.push(AttributedListing {
            player,
            canonical: m.record.name.clone(),
            source_name: record.name.clone(),
            position: listing_position(m.record, record),
            price: record.price.clone(),
            score: m.score,
        });
    }

    info!(
        listing = listing.len(),
        attributed = out.attributed.len(),
        unmatched = out.unmatched.len(),
        threshold,
        "listing attribution finished"
    );
    out
}

fn listing_position(player: &CanonicalPlayer, record: &ExternalRecord) -> String {
    [Some(player.position.as_str()), record.position.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|pos| !pos.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<CanonicalPlayer> {
        vec![
            CanonicalPlayer::new("David Raya", "GK", 3000.0),
            CanonicalPlayer::new("William Saliba", "DF", 3000.0),
            CanonicalPlayer::new("Declan Rice", "MF", 2800.0),
            CanonicalPlayer::new("Bukayo Saka", "FW,MF", 2500.0),
        ]
    }

    #[test]
    fn listing_rows_take_canonical_names() {
        let listing = vec![
            ExternalRecord::new("Saka Bukayo", "€140M"),
            ExternalRecord::new("Raya David", "€30M"),
            ExternalRecord::new("Someone Else", "€1M"),
        ];
        let out = attribute_listing(&listing, &roster(), &NameNormalizer::default(), 70, ClaimPolicy::FirstClaim);
        assert_eq!(out.attributed.len(), 2);
        assert_eq!(out.attributed[0].player, "Bukayo Saka");
        assert_eq!(out.attributed[0].position, "FW,MF");
        assert_eq!(out.attributed[0].source_name, "Saka Bukayo");
        assert_eq!(out.unmatched.len(), 1);
    }

    #[test]
    fn duplicate_claims_keep_first() {
        let listing = vec![
            ExternalRecord::new("Declan Rice", "€100M"),
            ExternalRecord::new("Rice Declan", "€90M"),
        ];
        let out = attribute_listing(&listing, &roster(), &NameNormalizer::default(), 70, ClaimPolicy::FirstClaim);
        assert_eq!(out.attributed.len(), 1);
        assert_eq!(out.attributed[0].price, "€100M");
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn rows_are_grouped_by_role() {
        let listing = vec![
            ExternalRecord::new("Bukayo Saka", "€140M"),
            ExternalRecord::new("David Raya", "€30M"),
            ExternalRecord::new("William Saliba", "€80M"),
        ];
        let out = attribute_listing(&listing, &roster(), &NameNormalizer::default(), 70, ClaimPolicy::FirstClaim);
        let ordered: Vec<&str> = out
            .ordered_by_role()
            .iter()
            .map(|row| row.player.as_str())
            .collect();
        assert_eq!(ordered, vec!["David Raya", "William Saliba", "Bukayo Saka"]);
    }

    #[test]
    fn every_row_keeps_listed_names_and_repeats() {
        let roster = vec![CanonicalPlayer::new("Emile Smith Rowe", "MF", 1500.0)];
        let listing = vec![
            ExternalRecord::new("Emile Smith Rowe", "€40M"),
            ExternalRecord::new("Emile Smith-Rowe", "€35M"),
        ];
        let out = attribute_listing(&listing, &roster, &NameNormalizer::first_two(), 80, ClaimPolicy::EveryRow);
        let rows: Vec<(&str, &str, &str)> = out
            .output_rows()
            .iter()
            .map(|r| (r.player.as_str(), r.canonical.as_str(), r.price.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Emile Smith Rowe", "Emile Smith Rowe", "€40M"),
                ("Emile Smith-Rowe", "Emile Smith Rowe", "€35M"),
            ]
        );
    }

    #[test]
    fn blank_roster_position_falls_back_to_listing() {
        let roster = vec![
            CanonicalPlayer::new("Ben White", "", 2000.0),
            CanonicalPlayer::new("Kai Havertz", "", 2000.0),
        ];
        let mut white = ExternalRecord::new("Ben White", "€45M");
        white.position = Some("DF".to_string());
        let listing = vec![white, ExternalRecord::new("Kai Havertz", "€60M")];
        let out = attribute_listing(&listing, &roster, &NameNormalizer::default(), 70, ClaimPolicy::FirstClaim);
        assert_eq!(out.attributed[0].position, "DF");
        assert_eq!(out.attributed[1].position, "Unknown");
        assert_eq!(out.ordered_by_role().len(), 1);
    }
}
