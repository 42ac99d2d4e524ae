//! The geometry kernel trait.

use lattice_types::{Aabb, Plane, Point2};
use nalgebra::{Point3, Vector3};

use crate::error::KernelResult;

/// Capability surface a geometry kernel offers to cell and lattice builders.
///
/// Every operation is synchronous and returns a new owned solid; inputs are
/// never modified. Box and sphere primitives are created centered on the
/// origin and positioned with [`GeometryKernel::place_at`].
pub trait GeometryKernel {
    /// Owned handle to one solid.
    type Solid: Clone + std::fmt::Debug;

    /// Box of the given extents, centered on the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if any extent is not strictly positive.
    fn create_box(&self, size: Vector3<f64>) -> KernelResult<Self::Solid>;

    /// Sphere of the given radius, centered on the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is negative or not finite.
    fn create_sphere(&self, radius: f64) -> KernelResult<Self::Solid>;

    /// Cylinder starting at `origin` and extending `length` along `direction`.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero direction, non-positive length or
    /// negative radius.
    fn create_cylinder(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        length: f64,
        radius: f64,
    ) -> KernelResult<Self::Solid>;

    /// Closed polygon in `plane` coordinates, extruded `thickness / 2` to
    /// both sides of the plane.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than three points or a negative thickness.
    fn create_polygon_extrusion(
        &self,
        plane: &Plane,
        points: &[Point2<f64>],
        thickness: f64,
    ) -> KernelResult<Self::Solid>;

    /// Boolean union.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot merge the solids.
    fn boolean_union(&self, a: &Self::Solid, b: &Self::Solid) -> KernelResult<Self::Solid>;

    /// Boolean intersection.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot intersect the solids.
    fn boolean_intersect(&self, a: &Self::Solid, b: &Self::Solid) -> KernelResult<Self::Solid>;

    /// Fillets every edge of `solid` lying inside `selection`.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius or an empty selection.
    fn fillet_edges(
        &self,
        solid: &Self::Solid,
        selection: &Aabb,
        radius: f64,
    ) -> KernelResult<Self::Solid>;

    /// Thickened skin of `solid`: `inner` below the surface, `outer` above it.
    ///
    /// # Errors
    ///
    /// Returns an error if both thicknesses are zero or either is negative.
    fn offset_shell(&self, solid: &Self::Solid, inner: f64, outer: f64)
        -> KernelResult<Self::Solid>;

    /// Axis-aligned bounds of `solid`.
    fn bounding_box(&self, solid: &Self::Solid) -> Aabb;

    /// Enclosed volume of `solid`.
    fn volume(&self, solid: &Self::Solid) -> f64;

    /// Copy of `solid` translated by `translation`.
    fn place_at(&self, solid: &Self::Solid, translation: Vector3<f64>) -> Self::Solid;

    /// Groups solids into one handle without merging them.
    ///
    /// # Errors
    ///
    /// Returns an error if `parts` is empty.
    fn compound(&self, parts: Vec<Self::Solid>) -> KernelResult<Self::Solid>;
}
