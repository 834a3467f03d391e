//! Aggregating decoder outputs from a pipeline results tree.
//!
//! A decoding run writes, per decoder, a directory named
//! `<model>-<run>-<step>-<subject>` containing a performance CSV, plus
//! prediction dumps named `<prefix>.<model>-run<run>-<step>-<subject>.pred.npy`.
//! Encoding dumps live under `<model>-<run>-<step>` directories. This module
//! discovers those artifacts, parses the identity out of the names, and
//! aggregates the contents into ordered tables keyed by [`DecoderId`].

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::core::EncodingSpace;
use crate::encodings::LoadError;

/// Errors surfaced by results aggregation.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("failed to extract checkpoint information from name {0:?}")]
    BadName(String),
    #[error("bad glob pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to walk results directory: {0}")]
    Walk(#[from] glob::GlobError),
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("no valid csv outputs found under {0}")]
    NoPerfFiles(PathBuf),
    #[error("no valid npy prediction files found under {0}")]
    NoPredFiles(PathBuf),
}

/// Identity of a learned decoder: which model checkpoint it targets and which
/// subject's brain images it reads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecoderId {
    pub model: String,
    pub run: u32,
    pub step: u64,
    pub subject: String,
}

/// Identity of a model encoding dump: model name, training run, and
/// checkpoint step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodingCkptId {
    pub model: String,
    pub run: u32,
    pub step: u64,
}

fn decoder_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w_]+)-(\d+)-(\d+)-([\w\d]+)$").unwrap())
}

fn encoding_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w_]+)-(\d+)-(\d+)$").unwrap())
}

fn pred_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(\w+)-run(\d+)-(\d+)-([\w\d]+)\.pred\.npy$").unwrap())
}

/// Parses decoder identity from an output-directory name
/// (`<model>-<run>-<step>-<subject>`).
pub fn parse_decoder_id(name: &str) -> Result<DecoderId, ResultsError> {
    let caps = decoder_dir_re()
        .captures(name)
        .ok_or_else(|| ResultsError::BadName(name.to_string()))?;
    Ok(DecoderId {
        model: caps[1].to_string(),
        run: caps[2].parse().map_err(|_| ResultsError::BadName(name.to_string()))?,
        step: caps[3].parse().map_err(|_| ResultsError::BadName(name.to_string()))?,
        subject: caps[4].to_string(),
    })
}

/// Parses encoding-checkpoint identity from an output-directory name
/// (`<model>-<run>-<step>`).
pub fn parse_encoding_ckpt_id(name: &str) -> Result<EncodingCkptId, ResultsError> {
    let caps = encoding_dir_re()
        .captures(name)
        .ok_or_else(|| ResultsError::BadName(name.to_string()))?;
    Ok(EncodingCkptId {
        model: caps[1].to_string(),
        run: caps[2].parse().map_err(|_| ResultsError::BadName(name.to_string()))?,
        step: caps[3].parse().map_err(|_| ResultsError::BadName(name.to_string()))?,
    })
}

/// One row of a decoder performance CSV. Extra columns in the file are
/// ignored; files missing any of these are skipped during aggregation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerfRecord {
    pub mse: f64,
    pub r2: f64,
    pub rank_median: f64,
    pub rank_mean: f64,
    pub rank_min: f64,
    pub rank_max: f64,
}

/// Per-decoder performance rows, ordered by decoder identity for stable
/// reporting.
pub type PerfTable = BTreeMap<DecoderId, Vec<PerfRecord>>;

/// Loads decoding performance across models, runs, steps, and subjects.
///
/// Recursively globs `*.csv` under `results_dir`; each file's parent
/// directory names the decoder. Files whose headers lack the expected metric
/// columns are skipped with a warning. An empty aggregate is an error.
pub fn load_decoding_perfs(results_dir: impl AsRef<Path>) -> Result<PerfTable, ResultsError> {
    let results_dir = results_dir.as_ref();
    let pattern = results_dir.join("**").join("*.csv");
    let pattern_str = pattern.to_string_lossy().into_owned();

    let mut table = PerfTable::new();
    for entry in glob::glob(&pattern_str).map_err(|source| ResultsError::BadPattern {
        pattern: pattern_str.clone(),
        source,
    })? {
        let path = entry?;
        let dir_name = match path.parent().and_then(|p| p.file_name()) {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let key = parse_decoder_id(&dir_name)?;

        match read_perf_csv(&path) {
            Ok(records) => {
                info!("{}: loaded {} perf rows", path.display(), records.len());
                table.entry(key).or_default().extend(records);
            }
            Err(err) => {
                // Mirrors the historical behavior of skipping CSVs without
                // the expected columns.
                warn!("{}: skipping unparseable perf file: {}", path.display(), err);
            }
        }
    }

    if table.is_empty() {
        return Err(ResultsError::NoPerfFiles(results_dir.to_path_buf()));
    }
    Ok(table)
}

fn read_perf_csv(path: &Path) -> Result<Vec<PerfRecord>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}

/// Loads decoder predictions keyed by decoder identity.
///
/// Globs `<glob_prefix>*.pred.npy` directly under `results_dir` and parses
/// identity from the file names. Files whose names do not match the pred
/// naming convention are skipped. An empty result set is an error.
pub fn load_decoding_preds(
    results_dir: impl AsRef<Path>,
    glob_prefix: Option<&str>,
) -> Result<BTreeMap<DecoderId, EncodingSpace>, ResultsError> {
    let results_dir = results_dir.as_ref();
    let pattern = results_dir.join(format!("{}*.pred.npy", glob_prefix.unwrap_or("")));
    let pattern_str = pattern.to_string_lossy().into_owned();

    let mut preds = BTreeMap::new();
    for entry in glob::glob(&pattern_str).map_err(|source| ResultsError::BadPattern {
        pattern: pattern_str.clone(),
        source,
    })? {
        let path = entry?;
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let caps = match pred_file_re().captures(&file_name) {
            Some(caps) => caps,
            None => {
                warn!("{}: skipping file not matching pred naming", path.display());
                continue;
            }
        };
        let key = DecoderId {
            model: caps[1].to_string(),
            run: caps[2].parse().map_err(|_| ResultsError::BadName(file_name.clone()))?,
            step: caps[3].parse().map_err(|_| ResultsError::BadName(file_name.clone()))?,
            subject: caps[4].to_string(),
        };

        let space = crate::encodings::load_matrix(&path)?;
        info!(
            "{}: loaded predictions of size {:?}",
            path.display(),
            space.shape()
        );
        preds.insert(key, space);
    }

    if preds.is_empty() {
        return Err(ResultsError::NoPredFiles(results_dir.to_path_buf()));
    }
    Ok(preds)
}

/// One row of a per-prediction rank CSV, as consumed by the significance
/// layer: which subject produced the brain image and what rank the correct
/// item received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankRow {
    pub subject: String,
    pub rank: f64,
}

/// Loads a per-prediction rank table (`subject, rank` columns; extra columns
/// ignored), preserving row order within each subject.
pub fn load_rank_table(path: impl AsRef<Path>) -> Result<Vec<RankRow>, ResultsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    reader
        .deserialize()
        .collect::<Result<Vec<RankRow>, csv::Error>>()
        .map_err(|source| ResultsError::Csv {
            path: path.to_path_buf(),
            source,
        })
}
