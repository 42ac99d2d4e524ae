//! Labeled corners of a unit cell.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::error::CornerIndexError;
use crate::size::CellSize;

/// A validated corner label in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerIndex(u8);

impl CornerIndex {
    /// First corner, `(-dx/2, -dy/2, -dz/2)`.
    pub const FIRST: Self = Self(1);
    /// Corner diagonally opposite to [`CornerIndex::FIRST`].
    pub const OPPOSITE: Self = Self(7);

    /// Validates a raw label.
    ///
    /// # Errors
    ///
    /// Returns [`CornerIndexError`] if `label` is outside `1..=8`.
    pub fn new(label: i64) -> Result<Self, CornerIndexError> {
        match u8::try_from(label) {
            Ok(value @ 1..=8) => Ok(Self(value)),
            _ => Err(CornerIndexError(label)),
        }
    }

    /// The label, `1..=8`.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Iterates all eight labels in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=8).map(Self)
    }
}

impl std::fmt::Display for CornerIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sign pattern `(sx, sy, sz)` of each corner, in label order.
const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// The eight corner coordinates of a unit cell centered on the origin.
///
/// # Example
///
/// ```
/// use lattice_types::{CellSize, CornerIndex, CornerSet, Point3};
///
/// let corners = CornerSet::from_size(CellSize::new(2.0, 4.0, 6.0));
/// assert_eq!(corners.get(CornerIndex::FIRST), Point3::new(-1.0, -2.0, -3.0));
/// assert_eq!(corners.get(CornerIndex::OPPOSITE), Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerSet {
    vertices: [Point3<f64>; 8],
}

impl CornerSet {
    /// Derives the corners of a cell of the given size.
    #[must_use]
    pub fn from_size(size: CellSize) -> Self {
        let half = size.to_vector() * 0.5;
        let vertices = CORNER_SIGNS
            .map(|[sx, sy, sz]| Point3::new(sx * half.x, sy * half.y, sz * half.z));
        Self { vertices }
    }

    /// Builds a corner set from explicit coordinates, in label order.
    #[must_use]
    pub const fn from_vertices(vertices: [Point3<f64>; 8]) -> Self {
        Self { vertices }
    }

    /// Coordinate of one corner.
    #[must_use]
    pub fn get(&self, index: CornerIndex) -> Point3<f64> {
        self.vertices[usize::from(index.0 - 1)]
    }

    /// All corners in label order.
    #[must_use]
    pub const fn vertices(&self) -> &[Point3<f64>; 8] {
        &self.vertices
    }

    /// The box spanned by corner 1 and corner 7.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.get(CornerIndex::FIRST),
            self.get(CornerIndex::OPPOSITE),
        )
    }
}
