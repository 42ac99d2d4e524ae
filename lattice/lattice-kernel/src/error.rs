//! Error types for kernel operations.

use thiserror::Error;

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors reported by a [`GeometryKernel`](crate::GeometryKernel).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// A numeric parameter is outside the range the operation accepts.
    #[error("{operation}: invalid {parameter} {value}")]
    InvalidParameter {
        /// Kernel operation that rejected the value.
        operation: &'static str,
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The operation received no geometry to work on.
    #[error("{operation}: no input geometry")]
    EmptyInput {
        /// Kernel operation that was called.
        operation: &'static str,
    },

    /// An edge selection matched nothing on the solid.
    #[error("{operation}: selection does not touch the solid")]
    EmptySelection {
        /// Kernel operation that was called.
        operation: &'static str,
    },
}

impl KernelError {
    /// Create an invalid parameter error.
    #[must_use]
    pub const fn invalid(operation: &'static str, parameter: &'static str, value: f64) -> Self {
        Self::InvalidParameter {
            operation,
            parameter,
            value,
        }
    }
}
