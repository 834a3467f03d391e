//! Loading stimulus sentences, model encodings, and brain images.
//!
//! All numeric interchange happens through `.npy` files (f64 matrices):
//! encoding pipelines dump one `N x D` matrix per model, and subject brain
//! images are exported to the same format upstream. Loading is thin glue —
//! read, optionally reduce dimensionality, concatenate — with shape checks
//! at every seam so the ranking stage can assume rectangular data.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use thiserror::Error;

use crate::core::EncodingSpace;
use crate::reduction::{DimensionalityReducer, ReductionError};

/// Errors surfaced by the loaders.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse npy file {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    #[error("encoding files disagree on row count: expected {expected}, got {actual} in {path}")]
    RowMismatch {
        expected: usize,
        actual: usize,
        path: PathBuf,
    },
    #[error("no encoding paths supplied")]
    NoPaths,
}

/// Loads the stimulus sentences, one per line, trimming trailing whitespace.
pub fn load_sentences(path: impl AsRef<Path>) -> Result<Vec<String>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sentences = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        sentences.push(line.trim_end().to_string());
    }
    Ok(sentences)
}

/// Reads one `.npy` f64 matrix into nested rows.
fn read_npy_rows(path: &Path) -> Result<Vec<Vec<f64>>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let arr = Array2::<f64>::read_npy(file).map_err(|source| LoadError::Npy {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(arr.rows().into_iter().map(|r| r.to_vec()).collect())
}

/// Loads encoding matrices from `.npy` files and joins them feature-wise.
///
/// Each path holds an `N x D_k` matrix of encodings for the same `N` stimuli;
/// the result is `N x (D_1 + ... + D_k)`. When `projection` is supplied, each
/// file is reduced to `target_dim` columns before concatenation (a reducer
/// returns wide-enough input unchanged, see [`crate::reduction`]).
///
/// # Errors
///
/// - [`LoadError::NoPaths`] when `paths` is empty.
/// - [`LoadError::RowMismatch`] when the files disagree on stimulus count.
/// - I/O, parse, and reduction failures are propagated.
pub fn load_encodings(
    paths: &[PathBuf],
    projection: Option<(&dyn DimensionalityReducer, usize)>,
) -> Result<EncodingSpace, LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoPaths);
    }

    let mut spaces = Vec::with_capacity(paths.len());
    let mut expected_rows = None;

    for path in paths {
        let mut rows = read_npy_rows(path)?;
        info!(
            "{}: loaded encodings of size {}x{}",
            path.display(),
            rows.len(),
            rows.first().map_or(0, |r| r.len())
        );

        match expected_rows {
            None => expected_rows = Some(rows.len()),
            Some(expected) if expected != rows.len() => {
                return Err(LoadError::RowMismatch {
                    expected,
                    actual: rows.len(),
                    path: path.clone(),
                });
            }
            Some(_) => {}
        }

        if let Some((reducer, target_dim)) = projection {
            rows = reducer.reduce(&rows, target_dim)?;
        }

        spaces.push(EncodingSpace::from_items(rows));
    }

    Ok(EncodingSpace::hstack(&spaces))
}

/// Loads a single `.npy` f64 matrix as an [`EncodingSpace`], with no
/// reduction or logging. Used for prediction dumps and other raw matrices.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<EncodingSpace, LoadError> {
    Ok(EncodingSpace::from_items(read_npy_rows(path.as_ref())?))
}

/// Loads one subject's brain images from a `.npy` matrix (rows are stimulus
/// presentations, columns are voxels), optionally reduced.
pub fn load_brain_images(
    path: impl AsRef<Path>,
    projection: Option<(&dyn DimensionalityReducer, usize)>,
) -> Result<EncodingSpace, LoadError> {
    let path = path.as_ref();
    let mut rows = read_npy_rows(path)?;
    info!(
        "{}: loaded brain images of size {}x{}",
        path.display(),
        rows.len(),
        rows.first().map_or(0, |r| r.len())
    );

    if let Some((reducer, target_dim)) = projection {
        rows = reducer.reduce(&rows, target_dim)?;
    }

    Ok(EncodingSpace::from_items(rows))
}
