mod test_checkpoint;
mod test_encodings;
mod test_stats;

use crate::core::EncodingSpace;

/// Identity-like dataset: n orthonormal n-dimensional basis vectors.
pub fn orthonormal_basis(n: usize) -> EncodingSpace {
    let items: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            row
        })
        .collect();
    EncodingSpace::from_items(items)
}

/// Deterministic "noisy cloud" fixture: k copies of each basis vector with a
/// small index-dependent perturbation, giving unambiguous nearest neighbors.
pub fn perturbed_basis(n: usize, noise: f64) -> EncodingSpace {
    let items: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row = vec![0.0; n];
            row[i] = 1.0;
            row[(i + 1) % n] = noise * (i as f64 + 1.0) / n as f64;
            row
        })
        .collect();
    EncodingSpace::from_items(items)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
