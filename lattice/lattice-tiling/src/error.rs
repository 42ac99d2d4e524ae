//! Error types for cell assembly and lattice tiling.

use lattice_kernel::KernelError;
use lattice_topology::TopologyError;
use thiserror::Error;

/// Result type alias for lattice operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Errors that can occur while building cells, lattices and infills.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LatticeError {
    /// A required setup step has not run yet.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    /// The configuration holds nothing to build.
    #[error("cell configuration has no solid entities")]
    NoTopology,

    /// A cell size component is not strictly positive and finite.
    #[error("cell size must be positive and finite, got ({dx}, {dy}, {dz})")]
    InvalidCellSize {
        /// Size along x.
        dx: f64,
        /// Size along y.
        dy: f64,
        /// Size along z.
        dz: f64,
    },

    /// The envelope has no extent in at least one dimension.
    #[error("invalid envelope: min {min:?} >= max {max:?} in at least one dimension")]
    InvalidBounds {
        /// Minimum corner of the envelope.
        min: [f64; 3],
        /// Maximum corner of the envelope.
        max: [f64; 3],
    },

    /// Shell thicknesses are negative, or both zero.
    #[error("shell thickness must be non-negative and not both zero, got inner={inner}, outer={outer}")]
    InvalidShellThickness {
        /// Thickness below the envelope surface.
        inner: f64,
        /// Thickness above the envelope surface.
        outer: f64,
    },

    /// The cell was built for a different size than the lattice layout uses.
    #[error("cell size {actual:?} does not match lattice cell size {expected:?}")]
    CellSizeMismatch {
        /// Cell size of the layout.
        expected: [f64; 3],
        /// Size of the built cell.
        actual: [f64; 3],
    },

    /// An entity cannot be turned into a solid.
    #[error("entity {index} is degenerate: {reason}")]
    DegenerateEntity {
        /// Position of the entity in its configuration.
        index: usize,
        /// What makes it degenerate.
        reason: &'static str,
    },

    /// A kernel operation failed, usually on degenerate geometry.
    #[error("{operation} failed: {source}; try a different {parameter}")]
    KernelFailure {
        /// Build step that issued the kernel call.
        operation: &'static str,
        /// The parameter most likely to resolve the failure when changed.
        parameter: &'static str,
        /// The kernel error.
        #[source]
        source: KernelError,
    },

    /// Descriptor or configuration error.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

impl LatticeError {
    /// Wraps a kernel error with the parameter to adjust.
    #[must_use]
    pub const fn kernel(
        operation: &'static str,
        parameter: &'static str,
        source: KernelError,
    ) -> Self {
        Self::KernelFailure {
            operation,
            parameter,
            source,
        }
    }
}

/// Adds build context to kernel results.
pub(crate) trait KernelContext<T> {
    fn context(self, operation: &'static str, parameter: &'static str) -> LatticeResult<T>;
}

impl<T> KernelContext<T> for Result<T, KernelError> {
    fn context(self, operation: &'static str, parameter: &'static str) -> LatticeResult<T> {
        self.map_err(|source| LatticeError::kernel(operation, parameter, source))
    }
}
