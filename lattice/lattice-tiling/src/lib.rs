//! Unit cell assembly, periodic lattice fitting and the infill pipeline.
//!
//! This crate turns a resolved [`CellConfiguration`](lattice_topology::CellConfiguration)
//! into geometry through any [`GeometryKernel`](lattice_kernel::GeometryKernel):
//!
//! - [`UnitaryCell`] builds one cell: nodes become spheres, struts cylinders,
//!   faces extruded polygons, fillet markers round the accumulated edges.
//! - [`LatticeLayout`] fits a whole number of cells into an envelope box,
//!   either growing the envelope (strict axes) or shrinking the cell.
//! - [`Lattice`] places a copy of the built cell at every grid position.
//! - [`InfillGenerator`] sequences envelope, shell, cell, lattice, trimming
//!   and union, discarding downstream products when a step changes.
//!
//! # Example
//!
//! ```
//! use lattice_kernel::{GeometryKernel, ImplicitKernel};
//! use lattice_tiling::{InfillGenerator, InfillParams};
//! use lattice_topology::parse_descriptors;
//! use lattice_types::{AxisFlags, Vector3};
//!
//! let kernel = ImplicitKernel::new().with_resolution(16);
//! let envelope = kernel.create_box(Vector3::repeat(20.0)).unwrap();
//! let params = InfillParams::cubic(7.0).with_strict(AxisFlags::all(true));
//! let topology = parse_descriptors("[1, 7, {'diameter': 1.0}]").unwrap();
//!
//! let result = InfillGenerator::run(kernel, envelope, &params, topology).unwrap();
//! assert_eq!(result.layout.placement_count(), 27);
//! assert!(result.cell_density > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cell;
mod error;
mod generator;
mod params;
#[cfg(test)]
mod testing;
mod tiling;

pub use cell::UnitaryCell;
pub use error::{LatticeError, LatticeResult};
pub use generator::{InfillGenerator, InfillResult};
pub use params::InfillParams;
pub use tiling::{Lattice, LatticeLayout};
