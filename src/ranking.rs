//! Rank evaluation of predicted encodings against a candidate pool.
//!
//! Given `N` predicted encodings, the index of the true dataset item for each
//! prediction, and the full `M`-item dataset of candidate encodings, compute
//! for every prediction the similarity ranking over all `M` candidates and
//! the rank position of the true item. This is the quantity decoding
//! experiments report: a perfect decoder puts the true item at rank 0.
//!
//! Similarity is the dot product of each (optionally centered and
//! row-normalized) prediction with every dataset encoding, so with
//! normalization enabled it behaves like cosine similarity against the
//! dataset's geometry.
//!
//! Ties between equally similar candidates are resolved by the stable sort
//! order over `f64::total_cmp`; that order is deterministic but
//! implementation-defined, and callers must not attach meaning to it.
//!
//! # Examples
//!
//! ```
//! use neurorank::core::EncodingSpace;
//! use neurorank::ranking::{eval_ranks, RankSummary};
//!
//! let dataset = EncodingSpace::from_items(vec![
//!     vec![1.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![0.7, 0.7],
//! ]);
//! let preds = EncodingSpace::from_items(vec![vec![0.9, 0.1]]);
//!
//! let eval = eval_ranks(&preds, &[0], &dataset, false).unwrap();
//! assert_eq!(eval.correct, vec![0]);
//!
//! let summary = RankSummary::from_ranks(&eval.correct);
//! assert_eq!(summary.max, 0);
//! ```

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::core::{norm, EncodingSpace};

/// Errors surfaced by [`eval_ranks`].
///
/// Both variants are non-recoverable for the call: validation happens before
/// any ranking work, and no partial result is ever produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RankError {
    /// Dimensionality of predictions and dataset disagree, or the index
    /// sequence length disagrees with the prediction count.
    #[error("shape mismatch: {context} ({left} vs {right})")]
    ShapeMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },
    /// An index references a nonexistent dataset row.
    #[error("dataset index {index} out of range for {nitems} dataset items")]
    IndexOutOfRange { index: usize, nitems: usize },
}

/// Output of [`eval_ranks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEvaluation {
    /// `N x M` matrix; each row is a permutation of `0..M` assigning to every
    /// dataset item its rank (0 = most similar) for that prediction.
    pub ranks: Vec<Vec<usize>>,
    /// Length-`N` vector; `correct[i] == ranks[i][indices[i]]`, the rank of
    /// the true matching dataset item for prediction `i`.
    pub correct: Vec<usize>,
}

/// Runs a rank evaluation on predicted encodings against the full dataset.
///
/// For each row of `predictions`, every row of `dataset` is scored by dot
/// product and the dataset items are ordered by decreasing similarity; the
/// returned matrix holds the rank each dataset item received, and `correct`
/// the rank of the item named by `indices`.
///
/// When `normalize` is true, predictions are first centered by subtracting
/// the column-wise mean across all predictions and then each row is scaled to
/// unit Euclidean norm. This matches the output convention of the linear
/// decoders upstream; callers whose predictions are already normalized pass
/// `false`. The flag exists because the preprocessing is a property of the
/// decoder, not of the ranking itself.
///
/// # Arguments
///
/// - `predictions`: `N x D` predicted encodings.
/// - `indices`: length-`N`; `indices[i]` is the dataset row that prediction
///   `i` should retrieve. Every value must lie in `0..M`.
/// - `dataset`: `M x D` candidate encodings, `M >= 1`.
/// - `normalize`: apply centering + unit-norm scaling to predictions first.
///
/// # Errors
///
/// - [`RankError::ShapeMismatch`] if `predictions.ndims != dataset.ndims` or
///   `indices.len() != predictions.nitems`.
/// - [`RankError::IndexOutOfRange`] if any index is `>= M`.
///
/// # Determinism
///
/// Rows are ranked with a stable sort over `f64::total_cmp`, so identical
/// inputs always produce identical outputs, including under the internal
/// rayon parallelism (rows are independent).
pub fn eval_ranks(
    predictions: &EncodingSpace,
    indices: &[usize],
    dataset: &EncodingSpace,
    normalize: bool,
) -> Result<RankEvaluation, RankError> {
    let (n, d) = predictions.shape();
    let (m, d_data) = dataset.shape();

    if d != d_data {
        return Err(RankError::ShapeMismatch {
            context: "prediction and dataset dimensionality differ",
            left: d,
            right: d_data,
        });
    }
    if indices.len() != n {
        return Err(RankError::ShapeMismatch {
            context: "index count and prediction count differ",
            left: indices.len(),
            right: n,
        });
    }
    if let Some(&bad) = indices.iter().find(|&&idx| idx >= m) {
        return Err(RankError::IndexOutOfRange {
            index: bad,
            nitems: m,
        });
    }

    debug!(
        "eval_ranks: N={}, M={}, D={}, normalize={}",
        n, m, d, normalize
    );

    let rows: Vec<Vec<f64>> = if normalize {
        normalize_predictions(predictions)
    } else {
        predictions.to_items()
    };

    let ranks: Vec<Vec<usize>> = rows
        .par_iter()
        .map(|pred| {
            let similarities: Vec<f64> = dataset
                .iter_rows()
                .map(|enc| pred.iter().zip(enc.iter()).map(|(a, b)| a * b).sum())
                .collect();
            rank_descending(&similarities)
        })
        .collect();

    let correct: Vec<usize> = ranks
        .iter()
        .zip(indices.iter())
        .map(|(row, &idx)| row[idx])
        .collect();

    Ok(RankEvaluation { ranks, correct })
}

/// Center predictions by their column means, then scale each row to unit norm.
fn normalize_predictions(predictions: &EncodingSpace) -> Vec<Vec<f64>> {
    let (n, d) = predictions.shape();

    let mut means = vec![0.0; d];
    for row in predictions.iter_rows() {
        for (m, x) in means.iter_mut().zip(row.iter()) {
            *m += x;
        }
    }
    for m in means.iter_mut() {
        *m /= n as f64;
    }

    predictions
        .iter_rows()
        .map(|row| {
            let mut centered: Vec<f64> = row
                .iter()
                .zip(means.iter())
                .map(|(x, m)| x - m)
                .collect();
            let len = norm(&centered);
            if len > 0.0 {
                centered.iter_mut().for_each(|x| *x /= len);
            }
            centered
        })
        .collect()
}

/// Converts similarity scores into descending-similarity ranks.
///
/// First pass sorts column indices by decreasing score (stable, so ties keep
/// their index order); second pass inverts that ordering so `ranks[j]` is the
/// position item `j` received. The inversion satisfies `ranks[order[k]] == k`
/// for every `k`, which is checked in debug builds.
fn rank_descending(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ranks = vec![0usize; scores.len()];
    for (k, &j) in order.iter().enumerate() {
        ranks[j] = k;
    }
    debug_assert!(order.iter().enumerate().all(|(k, &j)| ranks[j] == k));
    ranks
}

/// Summary statistics over a correct-rank vector, the quantities persisted in
/// per-decoder performance tables (`rank_mean`, `rank_median`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct RankSummary {
    pub mean: f64,
    pub median: f64,
    pub min: usize,
    pub max: usize,
}

impl RankSummary {
    /// Computes summary statistics from a non-empty rank vector.
    ///
    /// The median of an even-length vector is the mean of the two middle
    /// values.
    ///
    /// # Panics
    ///
    /// Panics if `ranks` is empty.
    pub fn from_ranks(ranks: &[usize]) -> RankSummary {
        assert!(!ranks.is_empty(), "cannot summarize an empty rank vector");

        let mut sorted = ranks.to_vec();
        sorted.sort_unstable();

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };

        RankSummary {
            mean: sorted.iter().sum::<usize>() as f64 / n as f64,
            median,
            min: sorted[0],
            max: sorted[n - 1],
        }
    }
}
