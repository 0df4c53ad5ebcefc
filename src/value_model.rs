use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::roles::Role;
use crate::roster::CanonicalPlayer;
use crate::valuation::to_millions;

const CATEGORICAL: [&str; 2] = ["Team", "Nation"];
const SPLIT_SEED: u64 = 42;
const TEST_FRACTION: f64 = 0.2;
const MIN_SPLIT_ROWS: usize = 6;
const KEY_WEIGHT: f64 = 2.0;
const MINUTES_WEIGHT: f64 = 1.5;
const AGE_WEIGHT: f64 = 0.5;

pub const MIN_ESTIMATE: f64 = 100_000.0;
pub const MAX_ESTIMATE: f64 = 200_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleFeatures {
    pub attributes: &'static [&'static str],
    pub key_attributes: &'static [&'static str],
}

impl RoleFeatures {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Goalkeeper => Self {
                attributes: &["Save%", "CS%", "GA90", "Minutes", "Age", "PK Save%", "Team", "Nation"],
                key_attributes: &["Save%", "CS%", "PK Save%"],
            },
            Role::Defender => Self {
                attributes: &[
                    "Tkl", "TklW", "Int", "Blocks", "Recov", "Minutes", "Team", "Age", "Nation",
                    "Aerl Won%", "Aerl Won", "Cmp", "Cmp%", "PrgP", "LongCmp%", "Carries",
                    "Touches", "Dis", "Mis",
                ],
                key_attributes: &["Tkl", "TklW", "Int", "Blocks", "Aerl Won%", "Aerl Won", "Recov"],
            },
            Role::Midfielder => Self {
                attributes: &[
                    "Cmp%", "KP", "PPA", "PrgP", "Tkl", "Ast", "SCA", "Touches", "Minutes", "Team",
                    "Age", "Nation", "Pass into 1_3", "xAG", "Carries 1_3", "ProDist", "Rec", "Mis",
                    "Dis",
                ],
                key_attributes: &["KP", "PPA", "PrgP", "SCA", "xAG", "Pass into 1_3", "Carries 1_3"],
            },
            Role::Forward => Self {
                attributes: &[
                    "Gls", "Ast", "Gls per 90", "xG per 90", "SoT%", "G per Sh", "SCA90", "GCA90",
                    "PrgC", "Carries 1_3", "Aerl Won%", "Team", "Age", "Minutes",
                ],
                key_attributes: &["Gls", "Ast", "Gls per 90", "xG per 90", "SCA90", "GCA90"],
            },
        }
    }

    pub fn numeric(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .copied()
            .filter(|attr| !CATEGORICAL.contains(attr))
            .collect()
    }

    pub fn categorical(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .copied()
            .filter(|attr| CATEGORICAL.contains(attr))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    pub train_rows: usize,
    pub test_rows: usize,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleEstimate {
    pub predicted_m: Vec<f64>,
    pub metrics: FitMetrics,
}

#[derive(Debug, Clone, PartialEq)]
struct FeatureRow {
    numeric: Vec<f64>,
    categorical: Vec<String>,
}

/// Standardized numeric columns and one-hot categories feeding an ordinary
/// least-squares fit with intercept.
#[derive(Debug, Clone, PartialEq)]
struct ValueModel {
    means: Vec<f64>,
    scales: Vec<f64>,
    categories: Vec<Vec<String>>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl ValueModel {
    fn fit(rows: &[&FeatureRow], targets: &[f64]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(anyhow!("no training rows"));
        };
        let numeric_cols = first.numeric.len();
        let mut means = Vec::with_capacity(numeric_cols);
        let mut scales = Vec::with_capacity(numeric_cols);
        for col in 0..numeric_cols {
            let values: Vec<f64> = rows.iter().map(|r| r.numeric[col]).collect();
            let avg = mean(&values);
            let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
            let std = var.sqrt();
            means.push(avg);
            scales.push(if std > 1e-12 { std } else { 1.0 });
        }
        let categories: Vec<Vec<String>> = (0..first.categorical.len())
            .map(|col| {
                rows.iter()
                    .map(|r| r.categorical[col].clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .collect();

        let mut model = Self {
            means,
            scales,
            categories,
            coefficients: Vec::new(),
            intercept: 0.0,
        };

        let encoded: Vec<Vec<f64>> = rows.iter().map(|r| model.encode(r)).collect();
        let width = encoded.first().map(Vec::len).unwrap_or(0);
        let col_means: Vec<f64> = (0..width)
            .map(|col| mean(&encoded.iter().map(|r| r[col]).collect::<Vec<_>>()))
            .collect();
        let target_mean = mean(targets);

        let centered: Vec<f64> = encoded
            .iter()
            .flat_map(|r| r.iter().zip(&col_means).map(|(v, m)| v - m))
            .collect();
        let x = DMatrix::from_row_slice(rows.len(), width, &centered);
        let y = DVector::from_iterator(targets.len(), targets.iter().map(|t| t - target_mean));

        let svd = x.svd(true, true);
        let tol = (svd.singular_values.max() * f64::EPSILON * rows.len().max(width) as f64).max(1e-12);
        let beta = svd
            .solve(&y, tol)
            .map_err(|err| anyhow!("least squares solve failed: {err}"))?;

        model.coefficients = beta.iter().copied().collect();
        model.intercept = target_mean
            - col_means
                .iter()
                .zip(&model.coefficients)
                .map(|(m, c)| m * c)
                .sum::<f64>();
        Ok(model)
    }

    fn encode(&self, row: &FeatureRow) -> Vec<f64> {
        let mut out: Vec<f64> = row
            .numeric
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect();
        // unseen categories encode as all zeros
        for (value, known) in row.categorical.iter().zip(&self.categories) {
            out.extend(known.iter().map(|k| if k == value { 1.0 } else { 0.0 }));
        }
        out
    }

    fn predict(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + self
                .encode(row)
                .iter()
                .zip(&self.coefficients)
                .map(|(x, c)| x * c)
                .sum::<f64>()
    }
}

/// Fits one role's linear value model on the priced rows and predicts every
/// row. `None` when no row has a valuation or the fit fails.
pub fn estimate_role_values(
    role: Role,
    players: &[&CanonicalPlayer],
    valuations: &[Option<f64>],
) -> Option<RoleEstimate> {
    let features = RoleFeatures::for_role(role);
    let rows = feature_rows(players, &features);
    let labeled: Vec<(usize, f64)> = valuations
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.filter(|v| v.is_finite()).map(|v| (idx, v)))
        .collect();
    if labeled.is_empty() {
        warn!(role = role.label(), "no priced rows to fit");
        return None;
    }

    let (train, test) = split_indices(labeled.len());
    let (train_rows, train_y) = pick(&rows, &labeled, &train);
    let (test_rows, test_y) = pick(&rows, &labeled, &test);

    let model = match ValueModel::fit(&train_rows, &train_y) {
        Ok(model) => model,
        Err(err) => {
            warn!(role = role.label(), error = %err, "value model fit failed");
            return None;
        }
    };

    let test_pred: Vec<f64> = test_rows.iter().map(|r| model.predict(r)).collect();
    let metrics = FitMetrics {
        train_rows: train_rows.len(),
        test_rows: test_rows.len(),
        rmse: rmse(&test_y, &test_pred),
        r2: r2(&test_y, &test_pred),
    };
    info!(
        role = role.label(),
        train = metrics.train_rows,
        test = metrics.test_rows,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "value model fitted"
    );

    let predicted_m = rows
        .iter()
        .map(|r| to_millions(model.predict(r).clamp(MIN_ESTIMATE, MAX_ESTIMATE)))
        .collect();
    Some(RoleEstimate {
        predicted_m,
        metrics,
    })
}

fn pick<'a>(rows: &'a [FeatureRow], labeled: &[(usize, f64)], idx: &[usize]) -> (Vec<&'a FeatureRow>, Vec<f64>) {
    idx.iter()
        .map(|&i| (&rows[labeled[i].0], labeled[i].1))
        .unzip()
}

fn feature_rows(players: &[&CanonicalPlayer], features: &RoleFeatures) -> Vec<FeatureRow> {
    let numeric = features.numeric();
    let categorical = features.categorical();
    let medians: Vec<f64> = numeric
        .iter()
        .map(|attr| median(players.iter().filter_map(|p| numeric_value(p, attr)).collect()).unwrap_or(0.0))
        .collect();

    players
        .iter()
        .map(|player| FeatureRow {
            numeric: numeric
                .iter()
                .zip(&medians)
                .map(|(attr, median)| {
                    let raw = numeric_value(player, attr).unwrap_or(*median);
                    raw.max(0.0).ln_1p() * attribute_weight(features, attr)
                })
                .collect(),
            categorical: categorical
                .iter()
                .map(|attr| categorical_value(player, attr))
                .collect(),
        })
        .collect()
}

fn attribute_weight(features: &RoleFeatures, attr: &str) -> f64 {
    let mut weight = if features.key_attributes.contains(&attr) { KEY_WEIGHT } else { 1.0 };
    match attr {
        "Minutes" => weight *= MINUTES_WEIGHT,
        "Age" => weight *= AGE_WEIGHT,
        _ => {}
    }
    weight
}

fn numeric_value(player: &CanonicalPlayer, attr: &str) -> Option<f64> {
    match attr {
        "Minutes" => Some(player.minutes).filter(|v| v.is_finite()),
        other => player.stats.get(other).copied().filter(|v| v.is_finite()),
    }
}

fn categorical_value(player: &CanonicalPlayer, attr: &str) -> String {
    let raw = match attr {
        "Team" => player.team.as_str(),
        other => player.tags.get(other).map(String::as_str).unwrap_or(""),
    };
    if raw.trim().is_empty() {
        "Unknown".to_string()
    } else {
        raw.trim().to_string()
    }
}

/// Seeded shuffle holding out a fifth of the rows; small sets train and test
/// on everything.
fn split_indices(n: usize) -> (Vec<usize>, Vec<usize>) {
    let all: Vec<usize> = (0..n).collect();
    if n < MIN_SPLIT_ROWS {
        return (all.clone(), all);
    }
    let test_len = (n as f64 * TEST_FRACTION).ceil() as usize;
    let mut shuffled = all;
    shuffled.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));
    let train = shuffled.split_off(test_len);
    (train, shuffled)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sq = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>();
    (sq / actual.len() as f64).sqrt()
}

fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let avg = mean(actual);
    let ss_tot = actual.iter().map(|a| (a - avg).powi(2)).sum::<f64>();
    let ss_res = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>();
    if ss_tot == 0.0 {
        return if ss_res < 1e-9 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(name: &str, team: &str, gls: Option<f64>) -> CanonicalPlayer {
        let mut p = CanonicalPlayer::new(name, "FW", 2000.0).with_team(team);
        if let Some(g) = gls {
            p.stats.insert("Gls".to_string(), g);
        }
        p
    }

    fn row(numeric: &[f64], categorical: &[&str]) -> FeatureRow {
        FeatureRow {
            numeric: numeric.to_vec(),
            categorical: categorical.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn least_squares_recovers_linear_relation() {
        let rows: Vec<FeatureRow> = (0..8)
            .map(|i| row(&[i as f64, (i * i) as f64], &[if i % 2 == 0 { "A" } else { "B" }]))
            .collect();
        let refs: Vec<&FeatureRow> = rows.iter().collect();
        let targets: Vec<f64> = rows
            .iter()
            .map(|r| 3.0 * r.numeric[0] - 0.5 * r.numeric[1] + 7.0)
            .collect();
        let model = ValueModel::fit(&refs, &targets).expect("fit");
        for (r, t) in rows.iter().zip(&targets) {
            assert!((model.predict(r) - t).abs() < 1e-6);
        }
        let unseen = row(&[10.0, 100.0], &["C"]);
        assert!((model.predict(&unseen) - (30.0 - 50.0 + 7.0)).abs() < 1e-6);
    }

    #[test]
    fn small_sets_train_and_test_on_everything() {
        let (train, test) = split_indices(5);
        assert_eq!(train, vec![0, 1, 2, 3, 4]);
        assert_eq!(test, train);
    }

    #[test]
    fn holdout_is_a_seeded_fifth() {
        let (train, test) = split_indices(10);
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 8);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(split_indices(10), (train, test));
    }

    #[test]
    fn missing_stats_take_the_median() {
        let players = [
            forward("A A", "X", Some(1.0)),
            forward("B B", "X", None),
            forward("C C", "", Some(3.0)),
        ];
        let refs: Vec<&CanonicalPlayer> = players.iter().collect();
        let rows = feature_rows(&refs, &RoleFeatures::for_role(Role::Forward));
        // Gls is the first forward attribute and a key attribute
        assert!((rows[1].numeric[0] - 2.0_f64.ln_1p() * 2.0).abs() < 1e-12);
        assert_eq!(rows[2].categorical[0], "Unknown");
    }

    #[test]
    fn predictions_are_clipped() {
        let players = [forward("A A", "X", Some(30.0))];
        let refs: Vec<&CanonicalPlayer> = players.iter().collect();
        let high = estimate_role_values(Role::Forward, &refs, &[Some(500_000_000.0)]).expect("estimate");
        assert_eq!(high.predicted_m, vec![200.0]);
        let low = estimate_role_values(Role::Forward, &refs, &[Some(10_000.0)]).expect("estimate");
        assert_eq!(low.predicted_m, vec![0.1]);
    }

    #[test]
    fn unpriced_rows_still_get_predictions() {
        let players = [
            forward("A A", "X", Some(10.0)),
            forward("B B", "Y", Some(2.0)),
            forward("C C", "X", Some(5.0)),
        ];
        let refs: Vec<&CanonicalPlayer> = players.iter().collect();
        let est = estimate_role_values(Role::Forward, &refs, &[Some(50_000_000.0), Some(5_000_000.0), None])
            .expect("estimate");
        assert_eq!(est.predicted_m.len(), 3);
        assert_eq!(est.metrics.train_rows, 2);
        assert_eq!(est.predicted_m[0], 50.0);
        assert_eq!(est.predicted_m[1], 5.0);
        assert!(estimate_role_values(Role::Forward, &refs, &[None, None, None]).is_none());
    }
}
