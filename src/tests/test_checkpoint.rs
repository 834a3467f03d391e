use std::path::Path;

use crate::checkpoint::{
    CheckpointError, CheckpointMetadata, CheckpointMetadataReader, StepMetrics,
};

use approx::assert_relative_eq;

#[test]
fn merge_step_fills_in_two_passes() {
    let mut meta = CheckpointMetadata::default();

    // Train events pass.
    meta.merge_step(
        250,
        StepMetrics {
            train_loss: Some(0.8),
            train_loss_norm: Some(0.0008),
            total_grad_norm: Some(12.5),
            ..Default::default()
        },
    );
    // Eval events pass for the same step.
    meta.merge_step(
        250,
        StepMetrics {
            eval_loss: Some(0.9),
            eval_accuracy: Some(0.71),
            ..Default::default()
        },
    );

    let step = &meta.steps[&250];
    assert_eq!(step.train_loss, Some(0.8));
    assert_eq!(step.total_grad_norm, Some(12.5));
    assert_eq!(step.eval_loss, Some(0.9));
    assert_eq!(step.eval_accuracy, Some(0.71));
}

#[test]
fn merge_step_does_not_erase_existing_values() {
    let mut meta = CheckpointMetadata::default();
    meta.merge_step(1, StepMetrics { train_loss: Some(2.0), ..Default::default() });
    meta.merge_step(1, StepMetrics::default());

    assert_eq!(meta.steps[&1].train_loss, Some(2.0));
}

#[test]
fn first_loss_normalization() {
    let meta = CheckpointMetadata {
        first_train_loss: Some(3.0),
        output_dims: Some(1000),
        ..Default::default()
    };
    assert_relative_eq!(meta.first_train_loss_norm().unwrap(), 0.003);

    let missing_dims = CheckpointMetadata {
        first_train_loss: Some(3.0),
        ..Default::default()
    };
    assert!(missing_dims.first_train_loss_norm().is_none());

    let zero_dims = CheckpointMetadata {
        first_train_loss: Some(3.0),
        output_dims: Some(0),
        ..Default::default()
    };
    assert!(zero_dims.first_train_loss_norm().is_none());
}

/// Minimal reader standing in for the framework-specific implementation.
struct FixtureReader;

impl CheckpointMetadataReader for FixtureReader {
    fn read_metadata(
        &self,
        savedir: &Path,
        checkpoint_step: Option<u64>,
    ) -> Result<CheckpointMetadata, CheckpointError> {
        if savedir.as_os_str().is_empty() {
            return Err(CheckpointError::NotFound(savedir.to_path_buf()));
        }
        let mut meta = CheckpointMetadata {
            global_steps: Some(500),
            output_dims: Some(768),
            first_train_loss: Some(4.2),
            ..Default::default()
        };
        let step = checkpoint_step.unwrap_or(500);
        meta.merge_step(
            step,
            StepMetrics {
                train_loss: Some(0.5),
                train_loss_norm: Some(0.5 / 768.0),
                ..Default::default()
            },
        );
        Ok(meta)
    }
}

#[test]
fn reader_trait_selects_step() {
    let meta = FixtureReader
        .read_metadata(Path::new("savedir"), Some(250))
        .unwrap();

    assert_eq!(meta.global_steps, Some(500));
    assert!(meta.steps.contains_key(&250));
    assert_relative_eq!(meta.first_train_loss_norm().unwrap(), 4.2 / 768.0);

    let err = FixtureReader.read_metadata(Path::new(""), None).unwrap_err();
    assert!(matches!(err, CheckpointError::NotFound(_)));
}
