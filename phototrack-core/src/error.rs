//! Error types for the geotagging engine

use std::path::PathBuf;

use thiserror::Error;

use crate::io::CollaboratorError;

/// Defensive invariant failure raised by the track search.
///
/// The store sorts its positions on construction, so observing a
/// decreasing pair during a search indicates caller error or corrupted
/// input, never a normal outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// Adjacent positions with decreasing time
    #[error("track positions are not sorted by increasing time (pair at index {index})")]
    Unsorted { index: usize },
}

/// Errors computing the camera clock offset.
///
/// Calibration is a hard prerequisite: any of these aborts the run
/// before a single photo is processed.
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// The true-time string did not parse in the required format
    #[error("true time must be in format yyyy-MM-dd HH:mm:ss, found: {input}")]
    InvalidFormat { input: String },

    /// The true-time string names a wall-clock time that does not exist
    /// (or exists twice) in the local zone
    #[error("true time is not a valid local wall-clock time: {input}")]
    InvalidLocalTime { input: String },

    /// The reference photo yielded no usable capture time
    #[error("reference photo {} has no usable capture time: {reason}", .path.display())]
    Reference { path: PathBuf, reason: String },
}

/// Pre-run configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Output directory would overwrite the input photos
    #[error("attempt made to write to input photo directory: {}", .dir.display())]
    OutputIsInput { dir: PathBuf },

    /// Output directory names an existing regular file
    #[error("output directory is a file: {}", .path.display())]
    OutputIsFile { path: PathBuf },

    /// Output directory could not be created
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker count of zero
    #[error("worker count must be greater than zero")]
    NoWorkers,

    /// Negative matching tolerance
    #[error("tolerance must not be negative: {0}")]
    NegativeTolerance(i64),
}

/// Top-level error for a geotagging run.
///
/// Everything here is fatal (see the taxonomy in the engine docs);
/// per-record failures are aggregated into the failed partition and
/// logged, never propagated through this type.
#[derive(Error, Debug)]
pub enum GeotagError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Track collaborator could not produce positions
    #[error("failed to parse track file {}: {source}", .path.display())]
    Track {
        path: PathBuf,
        #[source]
        source: CollaboratorError,
    },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// An output sink failed after the pipeline completed
    #[error("failed to write {artifact} output: {source}")]
    Export {
        artifact: String,
        #[source]
        source: CollaboratorError,
    },
}
