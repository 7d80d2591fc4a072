//! Unified error types for rbfn-swarm.
//!
//! This module provides [`SwarmError`], the error type shared by the
//! network, the candidates and the optimizer. It uses the `thiserror`
//! crate for ergonomic error handling.
//!
//! # Example
//!
//! ```rust
//! use rbfn_swarm::SwarmError;
//!
//! fn check_input(expected: usize, got: usize) -> Result<(), SwarmError> {
//!     if expected != got {
//!         return Err(SwarmError::shape_mismatch("input", expected, got));
//!     }
//!     Ok(())
//! }
//! assert!(check_input(2, 3).is_err());
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for rbfn-swarm operations.
///
/// A zero training error is not represented here: it is a legitimate
/// optimum and maps to [`DEGENERATE_FITNESS`](crate::config::DEGENERATE_FITNESS).
#[derive(Error, Debug)]
pub enum SwarmError {
    /// A parameter vector or input vector has the wrong length.
    ///
    /// Never recovered by truncating or padding.
    #[error("Shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which vector was malformed ("parameters", "input", ...).
        context: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length received.
        got: usize,
    },

    /// Invalid run configuration, raised before a run starts.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A dataset was built from zero samples.
    #[error("Training dataset is empty")]
    EmptyDataset,

    /// A dataset sample disagrees with the first sample's dimensionality.
    #[error("Sample {index} has {got} inputs, expected {expected}")]
    InconsistentDimension {
        /// Index of the offending sample.
        index: usize,
        /// Dimensionality of the first sample.
        expected: usize,
        /// Dimensionality found.
        got: usize,
    },

    /// A sample contains an infinite or NaN value.
    #[error("Sample {index} contains a non-finite value")]
    NonFiniteSample {
        /// Index of the offending sample.
        index: usize,
    },

    /// Malformed line in a training data file.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The worker pool could not be built or a worker task failed.
    ///
    /// The optimizer recovers from this by evaluating sequentially.
    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    /// The optimizer was asked to run from a terminal state.
    #[error("Invalid optimizer state: {0}")]
    InvalidState(String),

    /// I/O error while reading training data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rbfn-swarm operations.
pub type SwarmResult<T> = Result<T, SwarmError>;

impl SwarmError {
    /// Creates a shape mismatch error.
    pub fn shape_mismatch(context: &'static str, expected: usize, got: usize) -> Self {
        SwarmError::ShapeMismatch {
            context,
            expected,
            got,
        }
    }

    /// Creates a parse error.
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        SwarmError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a worker failure error.
    pub fn worker_failure<S: Into<String>>(msg: S) -> Self {
        SwarmError::WorkerFailure(msg.into())
    }

    /// Creates an invalid state error.
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        SwarmError::InvalidState(msg.into())
    }

    /// Returns true for errors the optimizer recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SwarmError::WorkerFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let err = SwarmError::shape_mismatch("parameters", 13, 12);
        let msg = err.to_string();
        assert!(msg.contains("Shape mismatch"));
        assert!(msg.contains("parameters"));
        assert!(msg.contains("13"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_config_error() {
        let err: SwarmError = ConfigError::InvalidCount("neuron_count").into();
        assert!(err.to_string().contains("Configuration error"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_worker_failure_is_recoverable() {
        let err = SwarmError::worker_failure("pool unavailable");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("pool unavailable"));
    }
}
