use std::fs;
use std::path::PathBuf;

use ndarray::Array2;
use ndarray_npy::write_npy;
use tempfile::TempDir;

use crate::encodings::{
    load_brain_images, load_encodings, load_matrix, load_sentences, LoadError,
};
use crate::reduction::RandomProjection;
use crate::tests::init_logger;

fn write_matrix(dir: &TempDir, name: &str, rows: usize, cols: usize, offset: f64) -> PathBuf {
    let data: Vec<f64> = (0..rows * cols).map(|i| offset + i as f64).collect();
    let arr = Array2::from_shape_vec((rows, cols), data).unwrap();
    let path = dir.path().join(name);
    write_npy(&path, &arr).unwrap();
    path
}

#[test]
fn sentences_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stimuli.txt");
    fs::write(&path, "The dog barked.\nA sentence with trailing space.  \nlast\n").unwrap();

    let sentences = load_sentences(&path).unwrap();
    assert_eq!(
        sentences,
        vec![
            "The dog barked.",
            "A sentence with trailing space.",
            "last"
        ]
    );
}

#[test]
fn missing_sentence_file_is_io_error() {
    let err = load_sentences("/nonexistent/stimuli.txt").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn load_single_matrix() {
    let dir = TempDir::new().unwrap();
    let path = write_matrix(&dir, "enc.npy", 3, 4, 0.0);

    let space = load_matrix(&path).unwrap();
    assert_eq!(space.shape(), (3, 4));
    assert_eq!(space.row(0), &[0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn encodings_concatenate_feature_wise() {
    init_logger();
    let dir = TempDir::new().unwrap();
    let a = write_matrix(&dir, "model_a.npy", 5, 3, 0.0);
    let b = write_matrix(&dir, "model_b.npy", 5, 2, 100.0);

    let space = load_encodings(&[a, b], None).unwrap();
    assert_eq!(space.shape(), (5, 5));
    // Row 0 is the first row of each file, side by side.
    assert_eq!(space.row(0), &[0.0, 1.0, 2.0, 100.0, 101.0]);
}

#[test]
fn encodings_row_mismatch_is_rejected() {
    let dir = TempDir::new().unwrap();
    let a = write_matrix(&dir, "model_a.npy", 5, 3, 0.0);
    let b = write_matrix(&dir, "model_b.npy", 4, 3, 0.0);

    let err = load_encodings(&[a, b], None).unwrap_err();
    assert!(matches!(
        err,
        LoadError::RowMismatch { expected: 5, actual: 4, .. }
    ));
}

#[test]
fn no_paths_is_rejected() {
    assert!(matches!(
        load_encodings(&[], None),
        Err(LoadError::NoPaths)
    ));
}

#[test]
fn encodings_with_projection() {
    let dir = TempDir::new().unwrap();
    let wide = write_matrix(&dir, "wide.npy", 6, 40, 0.0);

    let reducer = RandomProjection::new(128);
    let space = load_encodings(&[wide], Some((&reducer, 8))).unwrap();
    assert_eq!(space.shape(), (6, 8));
}

#[test]
fn brain_images_load_and_project() {
    let dir = TempDir::new().unwrap();
    let path = write_matrix(&dir, "subject.npy", 4, 50, 0.0);

    let raw = load_brain_images(&path, None).unwrap();
    assert_eq!(raw.shape(), (4, 50));

    let reducer = RandomProjection::new(1);
    let reduced = load_brain_images(&path, Some((&reducer, 10))).unwrap();
    assert_eq!(reduced.shape(), (4, 10));
}

#[test]
fn malformed_npy_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.npy");
    fs::write(&path, b"not an npy file").unwrap();

    let err = load_matrix(&path).unwrap_err();
    assert!(matches!(err, LoadError::Npy { .. }));
}
