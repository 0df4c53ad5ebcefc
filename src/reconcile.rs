use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::matcher::{BestMatch, CandidateIndex};
use crate::name_norm::NameNormalizer;
use crate::roster::{CanonicalPlayer, ExternalRecord};
use crate::valuation::parse_valuation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedPlayer {
    pub player: CanonicalPlayer,
    pub linked_name: Option<String>,
    pub link_score: Option<u8>,
    pub valuation: Option<f64>,
}

impl EnrichedPlayer {
    fn unlinked(player: CanonicalPlayer) -> Self {
        Self {
            player,
            linked_name: None,
            link_score: None,
            valuation: None,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.linked_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    pub enriched: Vec<EnrichedPlayer>,
    pub unmatched: Vec<String>,
}

impl Reconciliation {
    pub fn matched_count(&self) -> usize {
        self.enriched.iter().filter(|p| p.is_linked()).count()
    }

    pub fn linked(&self) -> impl Iterator<Item = &EnrichedPlayer> {
        self.enriched.iter().filter(|p| p.is_linked())
    }
}

/// Joins listing prices onto the roster by fuzzy name.
///
/// Works on a copy of the roster. Each canonical row gets at most one link;
/// the same listing row may back several canonical rows.
pub fn reconcile(
    roster: &[CanonicalPlayer],
    listing: &[ExternalRecord],
    normalizer: &NameNormalizer,
    threshold: u8,
) -> Reconciliation {
    let index = CandidateIndex::build(listing, normalizer);
    reconcile_with_index(roster, &index, threshold)
}

pub fn reconcile_with_index(
    roster: &[CanonicalPlayer],
    index: &CandidateIndex<'_, ExternalRecord>,
    threshold: u8,
) -> Reconciliation {
    let best: Vec<Option<BestMatch<'_, ExternalRecord>>> = roster
        .par_iter()
        .map(|player| index.match_one(&player.name))
        .collect();

    let mut out = Reconciliation {
        enriched: Vec::with_capacity(roster.len()),
        unmatched: Vec::new(),
    };

    for (player, candidate) in roster.iter().zip(best) {
        match candidate {
            Some(m) if m.accepted(threshold) => {
                debug!(
                    player = %player.name,
                    linked = %m.record.name,
                    score = m.score,
                    "linked"
                );
                out.enriched.push(EnrichedPlayer {
                    player: player.clone(),
                    linked_name: Some(m.record.name.clone()),
                    link_score: Some(m.score),
                    valuation: parse_valuation(&m.record.price),
                });
            }
            other => {
                debug!(
                    player = %player.name,
                    best = other.as_ref().map(|m| m.record.name.as_str()).unwrap_or("-"),
                    score = other.as_ref().map(|m| m.score).unwrap_or(0),
                    "no acceptable candidate"
                );
                out.unmatched.push(player.name.clone());
                out.enriched.push(EnrichedPlayer::unlinked(player.clone()));
            }
        }
    }

    info!(
        roster = roster.len(),
        candidates = index.len(),
        matched = out.matched_count(),
        unmatched = out.unmatched.len(),
        threshold,
        "reconciliation finished"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<CanonicalPlayer> {
        names
            .iter()
            .map(|n| CanonicalPlayer::new(n, "MF", 1000.0))
            .collect()
    }

    #[test]
    fn palmer_and_rice_link_at_seventy() {
        let roster = vec![
            CanonicalPlayer::new("Cole Palmer", "MF", 2000.0),
            CanonicalPlayer::new("Declan Rice", "MF", 1800.0),
        ];
        let listing = vec![
            ExternalRecord::new("Palmer, Cole", "€120M"),
            ExternalRecord::new("Rice D.", "£80M"),
        ];
        let out = reconcile(&roster, &listing, &NameNormalizer::default(), 70);
        assert!(out.unmatched.is_empty());
        assert_eq!(out.enriched[0].valuation, Some(120_000_000.0));
        assert_eq!(out.enriched[0].linked_name.as_deref(), Some("Palmer, Cole"));
        assert_eq!(out.enriched[0].link_score, Some(100));
        assert_eq!(out.enriched[1].valuation, Some(80_000_000.0));
    }

    #[test]
    fn rows_are_never_dropped() {
        let roster = roster(&["Cole Palmer", "", "Nobody Known", "Declan Rice"]);
        let listing = vec![ExternalRecord::new("Cole Palmer", "N/A")];
        let out = reconcile(&roster, &listing, &NameNormalizer::default(), 80);
        assert_eq!(out.enriched.len(), roster.len());
        assert_eq!(out.unmatched.len() + out.matched_count(), roster.len());
        assert_eq!(out.unmatched, vec!["", "Nobody Known", "Declan Rice"]);
        // linked, but the price was N/A
        assert!(out.enriched[0].is_linked());
        assert_eq!(out.enriched[0].valuation, None);
    }

    #[test]
    fn original_roster_is_untouched() {
        let roster = roster(&["Cole Palmer"]);
        let before = roster.clone();
        let listing = vec![ExternalRecord::new("Cole Palmer", "€1M")];
        let _ = reconcile(&roster, &listing, &NameNormalizer::default(), 70);
        assert_eq!(roster, before);
    }

    #[test]
    fn one_listing_row_may_back_many_players() {
        let roster = roster(&["John Smith", "Smith John"]);
        let listing = vec![ExternalRecord::new("John Smith", "€5M")];
        let out = reconcile(&roster, &listing, &NameNormalizer::default(), 90);
        assert_eq!(out.matched_count(), 2);
    }

    #[test]
    fn stricter_threshold_never_matches_more() {
        let roster = roster(&["Cole Palmer", "Declan Rice", "Bukayo Saka", "Kai Havertz"]);
        let listing = vec![
            ExternalRecord::new("Palmer, Cole", "€120M"),
            ExternalRecord::new("Rice D.", "£80M"),
            ExternalRecord::new("B. Saka", "€140M"),
        ];
        let norm = NameNormalizer::default();
        let mut last = usize::MAX;
        for threshold in [0u8, 50, 70, 71, 72, 80, 90, 100] {
            let matched = reconcile(&roster, &listing, &norm, threshold).matched_count();
            assert!(matched <= last, "threshold {threshold} matched {matched} > {last}");
            last = matched;
        }
    }
}
