//! Error types for lanr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using lanr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building plans or dispatching kernels
///
/// All validation happens at the plan / dispatch boundary, before any lane
/// runs. The parallel phases themselves never fail: every code path inside
/// them is total once a plan has been validated.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape product does not match the input element count
    #[error("Shape mismatch: shape {shape:?} describes {expected} elements, input has {got}")]
    ShapeMismatch {
        /// The offending shape
        shape: Vec<usize>,
        /// Element count implied by the shape
        expected: usize,
        /// Actual input element count
        got: usize,
    },

    /// Rank outside the supported `1..=8` range
    #[error("Invalid rank {rank}: supported ranks are 1..=8")]
    InvalidRank {
        /// The offending rank
        rank: usize,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Dtype requires a cargo feature that is not enabled
    #[error("DType {dtype:?} requires the '{feature}' feature")]
    FeatureRequired {
        /// The gated dtype
        dtype: DType,
        /// The cargo feature that enables it
        feature: &'static str,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Output buffer smaller than the operation's documented worst case
    #[error("Output buffer too small: need {needed} elements, got {got}")]
    OutputTooSmall {
        /// Required element count
        needed: usize,
        /// Provided element count
        got: usize,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(shape: &[usize], got: usize) -> Self {
        Self::ShapeMismatch {
            shape: shape.to_vec(),
            expected: shape.iter().product(),
            got,
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
