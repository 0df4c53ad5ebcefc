use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::matcher::CandidateIndex;
use crate::name_norm::NameNormalizer;
use crate::reconcile::{EnrichedPlayer, reconcile_with_index};
use crate::roles::{Role, primary_role};
use crate::roster::{CanonicalPlayer, ExternalRecord};
use crate::valuation::to_millions;
use crate::value_model::{FitMetrics, estimate_role_values};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRow {
    pub player: String,
    pub team: String,
    pub nation: String,
    pub role: Role,
    pub linked_name: String,
    pub link_score: u8,
    pub actual_value_m: Option<f64>,
    pub predicted_value_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleReport {
    pub role: Role,
    pub candidates: usize,
    pub rows: Vec<RoleRow>,
    pub unmatched: Vec<String>,
    pub fit: Option<FitMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleAnalysis {
    pub reports: Vec<RoleReport>,
}

impl RoleAnalysis {
    pub fn rows(&self) -> impl Iterator<Item = &RoleRow> {
        self.reports.iter().flat_map(|r| r.rows.iter())
    }

    /// All rows, highest predicted value first; unpredicted rows last.
    pub fn ranked_rows(&self) -> Vec<&RoleRow> {
        let mut rows: Vec<&RoleRow> = self.rows().collect();
        rows.sort_by(|a, b| match (a.predicted_value_m, b.predicted_value_m) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        rows
    }

    pub fn unmatched(&self) -> Vec<(Role, &str)> {
        self.reports
            .iter()
            .flat_map(|r| r.unmatched.iter().map(move |name| (r.role, name.as_str())))
            .collect()
    }

    pub fn report(&self, role: Role) -> Option<&RoleReport> {
        self.reports.iter().find(|r| r.role == role)
    }
}

/// Per-position link of roster players to listing values, followed by a
/// per-role value model over the linked rows.
///
/// Matched rows are de-duplicated on the linked listing name, first wins.
pub fn analyze_roles(
    roster: &[CanonicalPlayer],
    listing: &[ExternalRecord],
    normalizer: &NameNormalizer,
    threshold: u8,
) -> RoleAnalysis {
    let index = CandidateIndex::build(listing, normalizer);
    let mut out = RoleAnalysis::default();

    for role in Role::ALL {
        let subset: Vec<CanonicalPlayer> = roster
            .iter()
            .filter(|p| primary_role(&p.position) == Some(role))
            .cloned()
            .collect();
        let linked = reconcile_with_index(&subset, &index, threshold);

        let mut seen: HashSet<&str> = HashSet::new();
        let kept: Vec<&EnrichedPlayer> = linked
            .enriched
            .iter()
            .filter(|p| p.linked_name.as_deref().is_some_and(|name| seen.insert(name)))
            .collect();
        let players: Vec<&CanonicalPlayer> = kept.iter().map(|p| &p.player).collect();
        let valuations: Vec<Option<f64>> = kept.iter().map(|p| p.valuation).collect();
        let estimate = estimate_role_values(role, &players, &valuations);
        let rows: Vec<RoleRow> = kept
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                let predicted = estimate.as_ref().map(|e| e.predicted_m[idx]);
                role_row(role, p, predicted)
            })
            .collect();

        if !linked.unmatched.is_empty() {
            warn!(role = role.label(), count = linked.unmatched.len(), "unmatched players");
        }
        info!(role = role.label(), players = subset.len(), linked = rows.len(), "role linked");

        out.reports.push(RoleReport {
            role,
            candidates: subset.len(),
            rows,
            unmatched: linked.unmatched,
            fit: estimate.map(|e| e.metrics),
        });
    }
    out
}

fn role_row(role: Role, enriched: &EnrichedPlayer, predicted_value_m: Option<f64>) -> Option<RoleRow> {
    let linked_name = enriched.linked_name.clone()?;
    Some(RoleRow {
        player: enriched.player.name.clone(),
        team: enriched.player.team.clone(),
        nation: enriched.player.tags.get("Nation").cloned().unwrap_or_default(),
        role,
        linked_name,
        link_score: enriched.link_score.unwrap_or_default(),
        actual_value_m: enriched.valuation.map(to_millions),
        predicted_value_m,
    })
}
