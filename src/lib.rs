//! neurorank: offline analysis helpers for brain-decoding experiments.
//!
//! This crate collects the data-loading and statistical-evaluation routines
//! shared across decoding analysis scripts:
//!
//! - [`core`]: dense row-major encoding containers with zero-copy row access.
//! - [`ranking`]: the rank-evaluation core — given predicted encodings and the
//!   full dataset of candidate encodings, compute each prediction's similarity
//!   ranking over all candidates and the rank of the true item.
//! - [`reduction`]: dimensionality reduction behind a narrow trait (PCA and
//!   seeded random projection).
//! - [`encodings`]: loading stimulus sentences, model encodings, and brain
//!   images from `.npy` interchange files.
//! - [`results`]: aggregating decoder performance CSVs and prediction files
//!   produced by pipeline runs.
//! - [`stats`]: paired significance testing (Wilcoxon signed-rank) across
//!   models.
//! - [`checkpoint`]: training-checkpoint metadata model and reader boundary.
//!
//! Every entry point is a synchronous, side-effect-free call over in-memory
//! data (plus the obvious file reads in the loaders); nothing here shares
//! mutable state, so batch evaluation parallelizes trivially from the caller
//! side.
//!
//! # Example
//!
//! Rank two perfect predictions against a four-item candidate pool:
//!
//! ```
//! use neurorank::core::EncodingSpace;
//! use neurorank::ranking::eval_ranks;
//!
//! let dataset = EncodingSpace::from_items(vec![
//!     vec![1.0, 0.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0, 0.0],
//!     vec![0.0, 0.0, 1.0, 0.0],
//!     vec![0.0, 0.0, 0.0, 1.0],
//! ]);
//! let preds = EncodingSpace::from_items(vec![
//!     vec![0.0, 0.0, 1.0, 0.0],
//!     vec![1.0, 0.0, 0.0, 0.0],
//! ]);
//!
//! let eval = eval_ranks(&preds, &[2, 0], &dataset, false).unwrap();
//! assert_eq!(eval.correct, vec![0, 0]);
//! ```

pub mod checkpoint;
pub mod core;
pub mod encodings;
pub mod ranking;
pub mod reduction;
pub mod results;
pub mod stats;

#[cfg(test)]
mod tests;
