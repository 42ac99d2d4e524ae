//! Implicit (signed distance) reference kernel.

mod kernel;
mod solid;

pub use kernel::ImplicitKernel;
pub use solid::ImplicitSolid;
