//! Paired significance testing across decoding models.
//!
//! The ranking stage produces, per model and subject, a vector of
//! correct-item ranks. Deciding whether one model's representations decode
//! better than another's is a paired comparison of those vectors; the
//! workflow uses the Wilcoxon signed-rank test per subject, with an optional
//! Bonferroni correction across all comparisons.
//!
//! The test itself sits behind the [`PairedSignificanceTest`] trait so the
//! aggregation logic carries no dependency on any particular test.

use std::collections::BTreeMap;

use log::{debug, warn};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::results::RankRow;

/// Errors surfaced by significance testing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("paired samples have different lengths: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("paired samples are empty")]
    EmptySample,
    #[error("all paired differences are zero; the test statistic is undefined")]
    DegenerateSample,
    #[error("unknown model {0:?} in requested pair")]
    UnknownModel(String),
}

/// Outcome of a single paired test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    /// Test statistic (for Wilcoxon: the smaller of the signed rank sums).
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// A two-sided paired significance test over equal-length samples.
pub trait PairedSignificanceTest {
    fn test(&self, a: &[f64], b: &[f64]) -> Result<TestOutcome, StatsError>;
}

/// Two-sided Wilcoxon signed-rank test with the normal approximation.
///
/// Zero differences are excluded, tied absolute differences receive
/// midranks, and the variance carries the standard tie correction. The
/// statistic is `W = min(W+, W-)`, so the z-score is negative whenever any
/// asymmetry exists and the two-sided p-value is `2 * Phi(z)` clamped to 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct WilcoxonSignedRank;

impl PairedSignificanceTest for WilcoxonSignedRank {
    fn test(&self, a: &[f64], b: &[f64]) -> Result<TestOutcome, StatsError> {
        if a.len() != b.len() {
            return Err(StatsError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if a.is_empty() {
            return Err(StatsError::EmptySample);
        }

        let diffs: Vec<f64> = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| x - y)
            .filter(|d| *d != 0.0)
            .collect();
        if diffs.is_empty() {
            return Err(StatsError::DegenerateSample);
        }

        let n = diffs.len();
        let ranks = midranks(&diffs);

        let w_plus: f64 = diffs
            .iter()
            .zip(ranks.iter())
            .filter(|(d, _)| **d > 0.0)
            .map(|(_, r)| r)
            .sum();
        let total = n as f64 * (n as f64 + 1.0) / 2.0;
        let w_minus = total - w_plus;
        let statistic = w_plus.min(w_minus);

        let mean = total / 2.0;
        let tie_correction: f64 = tie_counts(&ranks)
            .into_iter()
            .map(|t| t * t * t - t)
            .sum::<f64>()
            / 48.0;
        let variance =
            n as f64 * (n as f64 + 1.0) * (2.0 * n as f64 + 1.0) / 24.0 - tie_correction;
        debug!(
            "wilcoxon: n={}, W+={}, W-={}, mean={}, var={}",
            n, w_plus, w_minus, mean, variance
        );

        let z = (statistic - mean) / variance.sqrt();
        let normal = Normal::new(0.0, 1.0).expect("unit normal is well-formed");
        let p_value = (2.0 * normal.cdf(-z.abs())).min(1.0);

        Ok(TestOutcome { statistic, p_value })
    }
}

/// 1-based ranks of `|diffs|` with ties assigned their average rank.
fn midranks(diffs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..diffs.len()).collect();
    order.sort_by(|&i, &j| diffs[i].abs().total_cmp(&diffs[j].abs()));

    let mut ranks = vec![0.0; diffs.len()];
    let mut k = 0;
    while k < order.len() {
        let mut j = k;
        while j + 1 < order.len()
            && diffs[order[j + 1]].abs() == diffs[order[k]].abs()
        {
            j += 1;
        }
        // positions k..=j hold tied values; average their 1-based ranks
        let midrank = (k + j + 2) as f64 / 2.0;
        for &idx in &order[k..=j] {
            ranks[idx] = midrank;
        }
        k = j + 1;
    }
    ranks
}

/// Sizes of tied groups among the assigned ranks (groups of size 1 included;
/// they contribute zero to the correction).
fn tie_counts(ranks: &[f64]) -> Vec<f64> {
    let mut sorted = ranks.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut counts = Vec::new();
    let mut k = 0;
    while k < sorted.len() {
        let mut j = k;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[k] {
            j += 1;
        }
        counts.push((j - k + 1) as f64);
        k = j + 1;
    }
    counts
}

/// Result of one model-pair comparison on one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub model_a: String,
    pub model_b: String,
    pub subject: String,
    pub statistic: f64,
    pub p_value: f64,
    /// Bonferroni-corrected p-value (p times the number of comparisons),
    /// present when correction was requested. Not clamped, matching the
    /// historical report.
    pub p_corrected: Option<f64>,
}

/// Compares correct-rank tables across models with a paired test.
///
/// `tables` maps model name to its per-prediction rank rows (see
/// [`crate::results::load_rank_table`]); rows are paired within each subject
/// by order of appearance. `pairs` selects the comparisons; when `None`, all
/// 2-combinations of models in name order are tested. Subjects present in
/// only one of a pair's tables are skipped with a warning.
///
/// Results are ordered by (model_a, model_b, subject).
pub fn wilcoxon_rank_preds(
    tables: &BTreeMap<String, Vec<RankRow>>,
    pairs: Option<&[(String, String)]>,
    bonferroni: bool,
    test: &dyn PairedSignificanceTest,
) -> Result<Vec<PairResult>, StatsError> {
    let default_pairs;
    let pairs: &[(String, String)] = match pairs {
        Some(pairs) => pairs,
        None => {
            default_pairs = all_pairs(tables);
            &default_pairs
        }
    };

    let mut results = Vec::new();
    for (model_a, model_b) in pairs {
        let rows_a = tables
            .get(model_a)
            .ok_or_else(|| StatsError::UnknownModel(model_a.clone()))?;
        let rows_b = tables
            .get(model_b)
            .ok_or_else(|| StatsError::UnknownModel(model_b.clone()))?;

        let by_subject_a = group_by_subject(rows_a);
        let by_subject_b = group_by_subject(rows_b);

        for (subject, ranks_a) in &by_subject_a {
            let ranks_b = match by_subject_b.get(subject) {
                Some(ranks) => ranks,
                None => {
                    warn!(
                        "subject {} present for {} but not {}; skipping",
                        subject, model_a, model_b
                    );
                    continue;
                }
            };
            let outcome = test.test(ranks_a, ranks_b)?;
            results.push(PairResult {
                model_a: model_a.clone(),
                model_b: model_b.clone(),
                subject: subject.clone(),
                statistic: outcome.statistic,
                p_value: outcome.p_value,
                p_corrected: None,
            });
        }
    }

    if bonferroni {
        let correction = results.len() as f64;
        for result in results.iter_mut() {
            result.p_corrected = Some(result.p_value * correction);
        }
    }

    results.sort_by(|a, b| {
        (&a.model_a, &a.model_b, &a.subject).cmp(&(&b.model_a, &b.model_b, &b.subject))
    });
    Ok(results)
}

fn all_pairs(tables: &BTreeMap<String, Vec<RankRow>>) -> Vec<(String, String)> {
    let models: Vec<&String> = tables.keys().collect();
    let mut pairs = Vec::new();
    for i in 0..models.len() {
        for j in i + 1..models.len() {
            pairs.push((models[i].clone(), models[j].clone()));
        }
    }
    pairs
}

fn group_by_subject(rows: &[RankRow]) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.subject.clone()).or_default().push(row.rank);
    }
    groups
}
