//! Error types for fusion runs.
//!
//! Every failure a run can surface maps to exactly one variant, so callers
//! can tell a bad invocation from a failing stage without parsing messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use volfuse_core::interpolation::UnknownInterpolation;
use volfuse_core::volume::StackError;

use crate::state::PipelineState;

/// Main error type for fusion operations.
#[derive(Error, Debug)]
pub enum FusionError {
    /// Input arity or emptiness violated; raised before any file is touched.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Workspace allocation, copy or export failed.
    #[error("{context}: {source}")]
    Resource {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Unsupported interpolation, verbosity or output name.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The warp operator failed for one source.
    #[error("warp {index} failed (image {}, field {}): {reason}", .image.display(), .field.display())]
    WarpApplication {
        index: usize,
        image: PathBuf,
        field: PathBuf,
        reason: String,
    },

    /// Volume `index` does not have the shape of volume 0.
    #[error("shape mismatch at volume {index}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Concatenation or mean failed for a reason other than shape.
    #[error("{operation} failed: {reason}")]
    Reduction {
        operation: &'static str,
        reason: String,
    },

    /// The run was cancelled while in `state`.
    #[error("cancelled in state {state}")]
    Cancelled { state: PipelineState },
}

/// Result type for fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

impl FusionError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn resource(context: impl Into<String>, source: io::Error) -> Self {
        Self::Resource {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// `reason` is rendered with its full cause chain.
    pub fn warp_application(
        index: usize,
        image: impl Into<PathBuf>,
        field: impl Into<PathBuf>,
        reason: &anyhow::Error,
    ) -> Self {
        Self::WarpApplication {
            index,
            image: image.into(),
            field: field.into(),
            reason: format!("{:#}", reason),
        }
    }

    pub fn reduction(operation: &'static str, reason: impl ToString) -> Self {
        Self::Reduction {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Index of the input this error is attributed to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::WarpApplication { index, .. } | Self::ShapeMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<UnknownInterpolation> for FusionError {
    fn from(err: UnknownInterpolation) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

impl From<StackError> for FusionError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Empty => Self::precondition("no volumes to merge"),
            StackError::ShapeMismatch {
                index,
                expected,
                actual,
            } => Self::ShapeMismatch {
                index,
                expected,
                actual,
            },
        }
    }
}
