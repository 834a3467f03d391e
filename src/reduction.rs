//! Dimensionality reduction behind a narrow trait.
//!
//! Encoding matrices and brain images routinely arrive with thousands of
//! columns; the analysis only needs enough of them to preserve the similarity
//! geometry the ranking stage scores against. The loaders therefore accept
//! any [`DimensionalityReducer`], and nothing in [`crate::ranking`] knows how
//! the reduction was produced.
//!
//! Two implementations are provided:
//!
//! - [`PcaReducer`]: principal component analysis via smartcore, the default
//!   for the offline workflow. Logs the retained-variance ratio after
//!   projection.
//! - [`RandomProjection`]: seeded Gaussian projection with 1/sqrt(r) scaling.
//!   By the Johnson-Lindenstrauss lemma a target dimension of
//!   O(log n / eps^2) approximately preserves pairwise distances, which is
//!   all a rank evaluation needs; use it when PCA over very wide inputs is
//!   too expensive. The projection matrix is never materialized: each call
//!   regenerates it from the stored seed, so a projection carries only its
//!   seed and is deterministic across runs.
//!
//! Both reducers return the input unchanged (with a warning) when it is
//! already at or below the requested dimensionality, matching the loaders'
//! historical behavior.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use smartcore::api::{Transformer, UnsupervisedEstimator};
use smartcore::decomposition::pca::{PCAParameters, PCA};
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use thiserror::Error;

/// Errors surfaced by reduction backends.
#[derive(Debug, Error)]
pub enum ReductionError {
    #[error("cannot reduce an empty matrix")]
    Empty,
    #[error("target dimensionality must be nonzero")]
    ZeroTarget,
    #[error("decomposition failed: {0}")]
    Backend(String),
}

/// Projects an `N x D` row collection down to `target_dim` columns.
///
/// Implementations must be deterministic for identical inputs and must not
/// change the number of rows. When `rows` is already at or below
/// `target_dim`, implementations return the input unchanged.
pub trait DimensionalityReducer {
    fn reduce(
        &self,
        rows: &[Vec<f64>],
        target_dim: usize,
    ) -> Result<Vec<Vec<f64>>, ReductionError>;
}

/// PCA reduction via smartcore.
///
/// Fits on the supplied rows and transforms them in one call; the offline
/// workflow never reuses a fit across matrices.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcaReducer;

impl DimensionalityReducer for PcaReducer {
    fn reduce(
        &self,
        rows: &[Vec<f64>],
        target_dim: usize,
    ) -> Result<Vec<Vec<f64>>, ReductionError> {
        if rows.is_empty() {
            return Err(ReductionError::Empty);
        }
        if target_dim == 0 {
            return Err(ReductionError::ZeroTarget);
        }

        let n = rows.len();
        let d = rows[0].len();
        if d <= target_dim {
            warn!(
                "input is already below requested dimensionality: {} <= {}",
                d, target_dim
            );
            return Ok(rows.to_vec());
        }

        info!("projecting {}x{} matrix to dimension {} with PCA", n, d, target_dim);

        let matrix = DenseMatrix::from_iterator(
            rows.iter().flat_map(|r| r.iter()).copied(),
            n,
            d,
            0,
        );
        let pca = PCA::fit(
            &matrix,
            PCAParameters::default().with_n_components(target_dim),
        )
        .map_err(|e| ReductionError::Backend(e.to_string()))?;
        let transformed = pca
            .transform(&matrix)
            .map_err(|e| ReductionError::Backend(e.to_string()))?;

        let reduced: Vec<Vec<f64>> = (0..n)
            .map(|i| transformed.get_row(i).iterator(0).copied().collect())
            .collect();

        let retained = total_variance(&reduced) / total_variance(rows);
        info!("PCA retained variance: {:.2}%", retained * 100.0);

        Ok(reduced)
    }
}

/// Sum of per-column variances of a row collection.
fn total_variance(rows: &[Vec<f64>]) -> f64 {
    let n = rows.len() as f64;
    let d = rows[0].len();

    let mut means = vec![0.0; d];
    for row in rows {
        for (m, x) in means.iter_mut().zip(row.iter()) {
            *m += x;
        }
    }
    for m in means.iter_mut() {
        *m /= n;
    }

    let mut var = 0.0;
    for row in rows {
        for (m, x) in means.iter().zip(row.iter()) {
            var += (x - m) * (x - m);
        }
    }
    var / n
}

/// Seeded Gaussian random projection.
///
/// The projection matrix is regenerated from `seed` on every call, so two
/// projections with the same seed and shapes are bitwise identical.
#[derive(Clone, Debug)]
pub struct RandomProjection {
    seed: u64,
}

impl RandomProjection {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Target dimension from the Johnson-Lindenstrauss bound: for `n_points`
    /// and tolerance `epsilon`, `r >= 8 ln(n) / eps^2` preserves pairwise
    /// distances within `(1 +- eps)` with high probability. Clamped below at
    /// 32 so tiny inputs keep a usable width.
    pub fn jl_dimension(n_points: usize, epsilon: f64) -> usize {
        debug!("computing JL dimension for {} points, eps={}", n_points, epsilon);
        let jl = (8.0 * (n_points as f64).ln() / epsilon.powi(2)).ceil() as usize;
        jl.max(32)
    }

    /// Projects a single row to `target_dim` columns.
    fn project(&self, row: &[f64], target_dim: usize) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let scale = 1.0 / (target_dim as f64).sqrt();

        let mut result = vec![0.0; target_dim];
        for &x in row {
            for r in result.iter_mut() {
                let sample: f64 = StandardNormal.sample(&mut rng);
                *r += x * sample * scale;
            }
        }
        result
    }
}

impl DimensionalityReducer for RandomProjection {
    fn reduce(
        &self,
        rows: &[Vec<f64>],
        target_dim: usize,
    ) -> Result<Vec<Vec<f64>>, ReductionError> {
        if rows.is_empty() {
            return Err(ReductionError::Empty);
        }
        if target_dim == 0 {
            return Err(ReductionError::ZeroTarget);
        }

        let d = rows[0].len();
        if d <= target_dim {
            warn!(
                "input is already below requested dimensionality: {} <= {}",
                d, target_dim
            );
            return Ok(rows.to_vec());
        }

        info!(
            "projecting {}x{} matrix to dimension {} with seeded Gaussian projection",
            rows.len(),
            d,
            target_dim
        );

        Ok(rows
            .par_iter()
            .map(|row| self.project(row, target_dim))
            .collect())
    }
}
