//! Training-checkpoint metadata model and reader boundary.
//!
//! Finetuning runs leave behind a checkpoint plus event logs recording
//! per-step losses, gradient norms, and eval metrics. Decoding analyses only
//! consume a small summary of that state, modeled here; the actual decoding
//! of framework-specific checkpoint and event formats lives behind
//! [`CheckpointMetadataReader`], implemented outside this crate by whatever
//! tooling wraps the training framework.
//!
//! Identity scraping from output-directory names (which model, run, and step
//! produced a dump) is in [`crate::results`] and re-exported here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use crate::results::{parse_decoder_id, parse_encoding_ckpt_id, DecoderId, EncodingCkptId};

/// Errors surfaced by checkpoint readers.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint found under {0}")]
    NotFound(PathBuf),
    #[error("no event log found under {0}")]
    MissingEvents(PathBuf),
    #[error("malformed checkpoint or event record: {0}")]
    Malformed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metrics recorded for one training step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepMetrics {
    pub train_loss: Option<f64>,
    /// Training loss divided by the output layer width, comparable across
    /// heads of different sizes.
    pub train_loss_norm: Option<f64>,
    pub eval_loss: Option<f64>,
    pub eval_accuracy: Option<f64>,
    /// Running sum of global gradient norms up to this step.
    pub total_grad_norm: Option<f64>,
}

/// Summary of a finetuned model instance, as scraped from its save
/// directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointMetadata {
    /// Global step counter stored in the checkpoint, when present.
    pub global_steps: Option<u64>,
    /// Width of the output layer, when present.
    pub output_dims: Option<usize>,
    /// Training loss at step 1, when the event log covers it.
    pub first_train_loss: Option<f64>,
    /// Per-step metrics, ordered by step.
    pub steps: BTreeMap<u64, StepMetrics>,
}

impl CheckpointMetadata {
    /// First training loss normalized by output width; `None` when either
    /// quantity is missing.
    pub fn first_train_loss_norm(&self) -> Option<f64> {
        match (self.first_train_loss, self.output_dims) {
            (Some(loss), Some(dims)) if dims > 0 => Some(loss / dims as f64),
            _ => None,
        }
    }

    /// Merges metrics into the entry for `step`, keeping existing values for
    /// fields the update leaves unset. Train and eval event streams are
    /// read independently, so a step is typically filled in two passes.
    pub fn merge_step(&mut self, step: u64, update: StepMetrics) {
        let entry = self.steps.entry(step).or_default();
        if update.train_loss.is_some() {
            entry.train_loss = update.train_loss;
        }
        if update.train_loss_norm.is_some() {
            entry.train_loss_norm = update.train_loss_norm;
        }
        if update.eval_loss.is_some() {
            entry.eval_loss = update.eval_loss;
        }
        if update.eval_accuracy.is_some() {
            entry.eval_accuracy = update.eval_accuracy;
        }
        if update.total_grad_norm.is_some() {
            entry.total_grad_norm = update.total_grad_norm;
        }
    }
}

/// Reads checkpoint metadata from a training save directory.
///
/// `checkpoint_step` selects a specific step when the directory holds
/// step-suffixed checkpoints; `None` means the unsuffixed latest checkpoint,
/// and implementations fail with [`CheckpointError::NotFound`] when neither
/// exists.
pub trait CheckpointMetadataReader {
    fn read_metadata(
        &self,
        savedir: &Path,
        checkpoint_step: Option<u64>,
    ) -> Result<CheckpointMetadata, CheckpointError>;
}
