use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::attribution::{Attribution, ClaimPolicy, attribute_listing};
use crate::config::LinkConfig;
use crate::name_norm::NameNormalizer;
use crate::reconcile::{Reconciliation, reconcile};
use crate::role_analysis::{RoleAnalysis, analyze_roles};
use crate::roster::{CanonicalPlayer, ExternalRecord, filter_min_minutes};

/// Named linking stages. Each one fixes a normalization rule and a default
/// acceptance threshold; the inputs and outputs are plain in-memory rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TransferFees,
    Valuations,
    RoleAnalysis,
}

impl Stage {
    pub fn threshold(self, cfg: &LinkConfig) -> u8 {
        match self {
            Stage::TransferFees => cfg.threshold_transfers,
            Stage::Valuations => cfg.threshold_valuations,
            Stage::RoleAnalysis => cfg.threshold_roles,
        }
    }

    pub fn normalizer(self, cfg: &LinkConfig) -> Result<NameNormalizer> {
        match self {
            Stage::TransferFees | Stage::RoleAnalysis => Ok(NameNormalizer::first_two()),
            Stage::Valuations => cfg.valuation_normalizer(),
        }
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "transfers" | "transfer-fees" | "fees" => Ok(Stage::TransferFees),
            "valuations" | "etv" => Ok(Stage::Valuations),
            "roles" | "role-analysis" => Ok(Stage::RoleAnalysis),
            other => Err(anyhow!("unknown stage '{other}' (expected transfers, valuations or roles)")),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::TransferFees => "transfers",
            Stage::Valuations => "valuations",
            Stage::RoleAnalysis => "roles",
        };
        f.write_str(name)
    }
}

pub fn run_reconcile(
    stage: Stage,
    cfg: &LinkConfig,
    roster: &[CanonicalPlayer],
    listing: &[ExternalRecord],
    threshold: Option<u8>,
) -> Result<Reconciliation> {
    let normalizer = stage.normalizer(cfg)?;
    let threshold = threshold.unwrap_or_else(|| stage.threshold(cfg)).min(100);
    Ok(reconcile(roster, listing, &normalizer, threshold))
}

pub fn run_role_analysis(
    cfg: &LinkConfig,
    roster: &[CanonicalPlayer],
    listing: &[ExternalRecord],
    threshold: Option<u8>,
) -> Result<RoleAnalysis> {
    let stage = Stage::RoleAnalysis;
    let normalizer = stage.normalizer(cfg)?;
    let threshold = threshold.unwrap_or_else(|| stage.threshold(cfg)).min(100);
    let eligible = filter_min_minutes(roster, cfg.min_minutes);
    Ok(analyze_roles(&eligible, listing, &normalizer, threshold))
}

/// Listing-side attribution. The transfer stage keeps every accepted row
/// under its listed name; the others keep one row per roster player.
pub fn run_attribution(
    stage: Stage,
    cfg: &LinkConfig,
    roster: &[CanonicalPlayer],
    listing: &[ExternalRecord],
    threshold: Option<u8>,
) -> Result<Attribution> {
    let normalizer = stage.normalizer(cfg)?;
    let threshold = threshold.unwrap_or_else(|| stage.threshold(cfg)).min(100);
    let policy = match stage {
        Stage::TransferFees => ClaimPolicy::EveryRow,
        Stage::Valuations | Stage::RoleAnalysis => ClaimPolicy::FirstClaim,
    };
    Ok(attribute_listing(listing, roster, &normalizer, threshold, policy))
}
