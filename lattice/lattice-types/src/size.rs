//! Per-axis cell dimensions, strictness switches and tile counts.

use std::ops::{Index, IndexMut};

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::axis::Axis;

/// Dimensions of a unit cell along each axis.
///
/// An all-zero size (the [`Default`]) means "no size supplied yet".
///
/// # Example
///
/// ```
/// use lattice_types::{Axis, CellSize};
///
/// let mut size = CellSize::new(7.0, 7.0, 5.0);
/// size[Axis::Z] = 6.0;
/// assert_eq!(size.volume(), 7.0 * 7.0 * 6.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSize {
    /// Extent along X.
    pub dx: f64,
    /// Extent along Y.
    pub dy: f64,
    /// Extent along Z.
    pub dz: f64,
}

impl CellSize {
    /// Creates a size from its three extents.
    #[must_use]
    pub const fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    /// Creates a cubic size with the same extent on every axis.
    #[must_use]
    pub const fn cubic(edge: f64) -> Self {
        Self::new(edge, edge, edge)
    }

    /// Returns true if no extent was supplied (all components are zero).
    #[must_use]
    #[allow(clippy::float_cmp)] // exact zero is the "unset" marker
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0 && self.dz == 0.0
    }

    /// Returns true if every component is finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self[axis].is_finite() && self[axis] > 0.0)
    }

    /// Nominal cell volume `dx * dy * dz`.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }

    /// The size as a vector.
    #[must_use]
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.dx, self.dy, self.dz)
    }

    /// Returns true if every component differs from `other` by at most `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| (self[axis] - other[axis]).abs() <= tolerance)
    }
}

impl Index<Axis> for CellSize {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.dx,
            Axis::Y => &self.dy,
            Axis::Z => &self.dz,
        }
    }
}

impl IndexMut<Axis> for CellSize {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.dx,
            Axis::Y => &mut self.dy,
            Axis::Z => &mut self.dz,
        }
    }
}

impl From<(f64, f64, f64)> for CellSize {
    fn from((dx, dy, dz): (f64, f64, f64)) -> Self {
        Self::new(dx, dy, dz)
    }
}

/// One boolean switch per axis.
///
/// In lattice fitting a set flag means "strict": keep the preferred cell
/// size and grow the envelope instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisFlags {
    /// Switch for X.
    pub x: bool,
    /// Switch for Y.
    pub y: bool,
    /// Switch for Z.
    pub z: bool,
}

impl AxisFlags {
    /// Creates flags from three switches.
    #[must_use]
    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Creates flags with the same value on every axis.
    #[must_use]
    pub const fn all(value: bool) -> Self {
        Self::new(value, value, value)
    }
}

impl Index<Axis> for AxisFlags {
    type Output = bool;

    fn index(&self, axis: Axis) -> &bool {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for AxisFlags {
    fn index_mut(&mut self, axis: Axis) -> &mut bool {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl From<(bool, bool, bool)> for AxisFlags {
    fn from((x, y, z): (bool, bool, bool)) -> Self {
        Self::new(x, y, z)
    }
}

/// Number of unit cells tiled along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Periodicity {
    /// Tiles along X.
    pub nx: usize,
    /// Tiles along Y.
    pub ny: usize,
    /// Tiles along Z.
    pub nz: usize,
}

impl Periodicity {
    /// Creates a periodicity from three tile counts.
    #[must_use]
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of tiles `nx * ny * nz`, saturating at `usize::MAX`.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.nx.saturating_mul(self.ny).saturating_mul(self.nz)
    }

    /// Total number of tiles, or `None` if the product overflows.
    #[must_use]
    pub const fn checked_count(&self) -> Option<usize> {
        match self.nx.checked_mul(self.ny) {
            Some(nxy) => nxy.checked_mul(self.nz),
            None => None,
        }
    }
}

impl Index<Axis> for Periodicity {
    type Output = usize;

    fn index(&self, axis: Axis) -> &usize {
        match axis {
            Axis::X => &self.nx,
            Axis::Y => &self.ny,
            Axis::Z => &self.nz,
        }
    }
}

impl IndexMut<Axis> for Periodicity {
    fn index_mut(&mut self, axis: Axis) -> &mut usize {
        match axis {
            Axis::X => &mut self.nx,
            Axis::Y => &mut self.ny,
            Axis::Z => &mut self.nz,
        }
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}
