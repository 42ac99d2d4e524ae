//! Geometric value types shared by the lattice crates.
//!
//! - [`Aabb`] - Axis-aligned box used for envelopes and edge selections
//! - [`Axis`] - One of the three coordinate axes, used to index per-axis values
//! - [`CellSize`], [`AxisFlags`], [`Periodicity`] - Per-axis cell dimensions,
//!   strictness switches and tile counts
//! - [`CornerIndex`] and [`CornerSet`] - The eight labeled corners of a unit cell
//! - [`Plane`] - An oriented plane frame for extruding face polygons
//!
//! # Corner Convention
//!
//! A unit cell of size `(dx, dy, dz)` is centered on the origin. With
//! `h = size / 2` the corners are numbered:
//!
//! | corner | x | y | z |
//! |---|---|---|---|
//! | 1 | −hx | −hy | −hz |
//! | 2 | −hx | +hy | −hz |
//! | 3 | +hx | +hy | −hz |
//! | 4 | +hx | −hy | −hz |
//! | 5 | −hx | −hy | +hz |
//! | 6 | +hx | −hy | +hz |
//! | 7 | +hx | +hy | +hz |
//! | 8 | −hx | +hy | +hz |
//!
//! Corners 1 and 7 are diagonally opposite.
//!
//! # Example
//!
//! ```
//! use lattice_types::{CellSize, CornerIndex, CornerSet, Point3};
//!
//! let corners = CornerSet::from_size(CellSize::new(2.0, 2.0, 2.0));
//! let c7 = corners.get(CornerIndex::new(7).unwrap());
//! assert_eq!(c7, Point3::new(1.0, 1.0, 1.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod aabb;
mod axis;
mod corners;
mod error;
mod plane;
mod size;

pub use aabb::Aabb;
pub use axis::Axis;
pub use corners::{CornerIndex, CornerSet};
pub use error::{AxisIndexError, CornerIndexError};
pub use plane::Plane;
pub use size::{AxisFlags, CellSize, Periodicity};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};
