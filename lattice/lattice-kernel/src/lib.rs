//! Geometry kernel seam for lattice construction.
//!
//! Unit cells and lattices never build solids themselves. They issue
//! primitive, boolean, fillet and shell requests through the
//! [`GeometryKernel`] trait and hold the kernel's owned [`GeometryKernel::Solid`]
//! handles.
//!
//! # Reference Kernel
//!
//! [`ImplicitKernel`] implements the trait with analytic signed distance
//! functions. Booleans are min/max combinations, fillets are smooth unions
//! and volumes are measured by regular-grid sampling, so results are exact for
//! topology and approximate (to the sampling resolution) for volume.
//!
//! ```
//! use lattice_kernel::{GeometryKernel, ImplicitKernel};
//! use nalgebra::Vector3;
//!
//! let kernel = ImplicitKernel::new().with_resolution(32);
//! let cube = kernel.create_box(Vector3::new(2.0, 2.0, 2.0)).unwrap();
//! let volume = kernel.volume(&cube);
//! assert!((volume - 8.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod implicit;
mod kernel;

pub use error::{KernelError, KernelResult};
pub use implicit::{ImplicitKernel, ImplicitSolid};
pub use kernel::GeometryKernel;
