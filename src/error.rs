//! Error types for volume construction, slicing, estimation and stitching.
//!
//! Only structural problems surface as errors. Weak or empty feature evidence
//! is not an error: estimators fall back to per-axis defaults and log it.

use crate::volume::{Plane, Size3};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for stitching operations.
#[derive(Error, Debug)]
pub enum StitchError {
    /// Lateral dimensions of two volumes differ.
    #[error("Shape mismatch: first volume is {first}, second volume is {second}")]
    ShapeMismatch { first: Size3, second: Size3 },

    /// Voxel buffer length does not match the declared dimensions.
    #[error("Buffer size mismatch: expected {expected} voxels, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Intensity range with `min > max` or non-finite bounds.
    #[error("Invalid intensity range [{min}, {max}]")]
    InvalidRange { min: f32, max: f32 },

    /// Slice index outside the extent of the cut axis.
    #[error("Slice index {index} out of range for {plane:?} plane (extent {extent})")]
    SliceOutOfRange {
        plane: Plane,
        index: usize,
        extent: usize,
    },

    /// Volume with a zero dimension handed to an estimator.
    #[error("Volume {0} has no voxels")]
    EmptyVolume(Size3),

    /// Sequential stitching needs at least one scan.
    #[error("Cannot stitch an empty series")]
    EmptySeries,

    /// Invalid metadata or tool configuration.
    #[error("Invalid metadata: {0}")]
    Metadata(String),

    /// Filesystem failure with the offending path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decode or encode failure.
    #[error("Image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for stitching operations.
pub type Result<T> = std::result::Result<T, StitchError>;

impl StitchError {
    /// Create a metadata error.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an image codec error with the path it occurred on.
    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
