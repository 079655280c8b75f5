//! 错误类型
//!
//! Every fallible operation of the crate returns [`Result`]. Failures are
//! detected locally and returned to the caller; nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VprError {
    /// Non-positive voxel size, zero frame budget, zero step and the like.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The query point cloud occupies no voxel of the grid.
    #[error("query point cloud is empty after voxel down sampling")]
    EmptyQuery,

    /// Neither point cloud occupies a voxel of the grid.
    #[error("union of point clouds is empty after voxel down sampling")]
    EmptyUnion,

    #[error("database has no frames")]
    EmptyDatabase,

    /// No frame contributes a single point, so the scene has no bounds.
    #[error("database scene contains no points")]
    EmptyScene,

    #[error("frame index {index} is out of range for a database of {len} frames")]
    FrameIndexOutOfRange { index: usize, len: usize },

    #[error("invalid pose: {0}")]
    InvalidPose(String),

    #[error("failed to parse {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VprError>;

impl VprError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        VprError::InvalidConfiguration(message.into())
    }

    /// Checks a scalar that must be strictly positive and finite.
    pub(crate) fn check_positive(name: &str, value: f64) -> Result<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::invalid_config(format!(
                "{name} must be positive, got {value}"
            )))
        }
    }

    pub(crate) fn check_finite(name: &str, value: f64) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::invalid_config(format!(
                "{name} must be finite, got {value}"
            )))
        }
    }
}
