//! Periodic truss and surface lattice generation.
//!
//! This umbrella crate re-exports the lattice-* crates. A unit cell is
//! described by compact descriptors naming cell corners and weighted relations
//! between them; the cell is built through a geometry kernel, tiled over a
//! grid fitted to an envelope, trimmed to it and united with a shell.
//!
//! # Quick Start
//!
//! ```
//! use lattice::prelude::*;
//!
//! let kernel = ImplicitKernel::new().with_resolution(16);
//! let envelope = kernel.create_box(Vector3::repeat(20.0)).unwrap();
//!
//! let mut generator = InfillGenerator::new(kernel);
//! generator.set_envelope(envelope);
//! generator.create_shell(1.2, 0.0).unwrap();
//! generator.init_unitary_cell(CellSize::cubic(7.0), AxisFlags::all(true)).unwrap();
//! generator.add_entities_str(
//!     "['var', {'name': 'd', 'value': 0.8}],\n\
//!      [1, 7, {'diameter': 'd'}],\n\
//!      [2, 8, {'diameter': 'd'}]",
//! ).unwrap();
//! generator.create_unitary_cell().unwrap();
//! generator.create_lattice().unwrap();
//! generator.intersect_lattice().unwrap();
//! generator.unify().unwrap();
//!
//! assert_eq!(generator.layout().unwrap().periodicity(), Periodicity::new(3, 3, 3));
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Value types: `Aabb`, `CellSize`, `AxisFlags`, `Periodicity`, corners, planes
//! - [`kernel`] - The `GeometryKernel` seam and the reference `ImplicitKernel`
//! - [`topology`] - Descriptor grammar, entity resolution, cell configurations
//! - [`tiling`] - Unit cells, lattice fitting and tiling, the infill pipeline
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for value types, layouts and parameters

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Value types: boxes, cell sizes, corners, planes.
pub use lattice_types as types;

/// Geometry kernel seam and reference kernel.
pub use lattice_kernel as kernel;

/// Descriptor grammar, entity resolution, cell configurations.
pub use lattice_topology as topology;

/// Unit cells, lattice fitting and tiling, infill pipeline.
pub use lattice_tiling as tiling;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for lattice generation.
///
/// # Usage
///
/// ```
/// use lattice::prelude::*;
/// ```
pub mod prelude {
    // Value types
    pub use lattice_types::{
        Aabb, Axis, AxisFlags, CellSize, CornerSet, Periodicity, Point3, Vector3,
    };

    // Kernel
    pub use lattice_kernel::{GeometryKernel, ImplicitKernel};

    // Topology
    pub use lattice_topology::{CellConfiguration, Descriptor, Entity, EntityKind, NodeRef};

    // Tiling (main use case)
    pub use lattice_tiling::{
        InfillGenerator, InfillParams, Lattice, LatticeError, LatticeLayout, UnitaryCell,
    };
}

// =============================================================================
// Tests
// =============================================================================
