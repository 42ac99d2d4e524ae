//! Infill pipeline parameters.

use lattice_types::{AxisFlags, CellSize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};

/// Parameters for a complete infill run.
///
/// An infill is an outer shell offset from the envelope surface plus a
/// lattice of unit cells trimmed to the envelope.
///
/// # Examples
///
/// ```
/// use lattice_tiling::InfillParams;
/// use lattice_types::{AxisFlags, CellSize};
///
/// let params = InfillParams::cubic(7.0)
///     .with_strict(AxisFlags::all(true))
///     .with_shell(1.0, 0.0);
/// assert_eq!(params.cell_size, CellSize::cubic(7.0));
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InfillParams {
    /// Preferred unit cell size.
    pub cell_size: CellSize,

    /// Axes along which the cell size is kept and the envelope grows.
    pub strict: AxisFlags,

    /// Whether unit cell geometry is clipped to its box.
    pub clip_cell: bool,

    /// Shell thickness below the envelope surface in mm.
    pub shell_inner: f64,

    /// Shell thickness above the envelope surface in mm.
    pub shell_outer: f64,
}

impl Default for InfillParams {
    fn default() -> Self {
        Self {
            cell_size: CellSize::cubic(5.0),
            strict: AxisFlags::all(false),
            clip_cell: true,
            shell_inner: 1.2,
            shell_outer: 0.0,
        }
    }
}

impl InfillParams {
    /// Creates default infill parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates parameters for cubic cells of the given edge length.
    #[must_use]
    pub fn cubic(edge: f64) -> Self {
        Self::default().with_cell_size(CellSize::cubic(edge))
    }

    /// Sets the preferred cell size.
    #[must_use]
    pub const fn with_cell_size(mut self, size: CellSize) -> Self {
        self.cell_size = size;
        self
    }

    /// Sets the per-axis strictness.
    #[must_use]
    pub const fn with_strict(mut self, strict: AxisFlags) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables clipping of the unit cell to its box.
    #[must_use]
    pub const fn with_clipping(mut self, enabled: bool) -> Self {
        self.clip_cell = enabled;
        self
    }

    /// Sets the shell thicknesses below and above the envelope surface.
    #[must_use]
    pub const fn with_shell(mut self, inner: f64, outer: f64) -> Self {
        self.shell_inner = inner;
        self.shell_outer = outer;
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::InvalidCellSize`] unless every cell size component is
    ///   positive and finite
    /// - [`LatticeError::InvalidShellThickness`] if a thickness is negative or
    ///   not finite, or both are zero
    pub fn validate(&self) -> LatticeResult<()> {
        if !self.cell_size.is_valid() {
            return Err(LatticeError::InvalidCellSize {
                dx: self.cell_size.dx,
                dy: self.cell_size.dy,
                dz: self.cell_size.dz,
            });
        }
        let usable = |t: f64| t.is_finite() && t >= 0.0;
        if !usable(self.shell_inner)
            || !usable(self.shell_outer)
            || self.shell_inner + self.shell_outer <= 0.0
        {
            return Err(LatticeError::InvalidShellThickness {
                inner: self.shell_inner,
                outer: self.shell_outer,
            });
        }
        Ok(())
    }
}
