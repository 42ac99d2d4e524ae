//! [`GeometryKernel`] implementation over signed distance solids.

// Sample counts and grid indices are converted to floating point coordinates
#![allow(clippy::cast_precision_loss)]

use lattice_types::{Aabb, Plane, Point2};
use nalgebra::{Point3, Unit, Vector3};
use tracing::debug;

use super::solid::{ImplicitSolid, Shape};
use crate::error::{KernelError, KernelResult};
use crate::kernel::GeometryKernel;

/// Default samples per axis for volume measurement.
const DEFAULT_RESOLUTION: usize = 64;

/// Reference kernel built on analytic signed distance functions.
///
/// # Example
///
/// ```
/// use lattice_kernel::{GeometryKernel, ImplicitKernel};
/// use nalgebra::Vector3;
///
/// let kernel = ImplicitKernel::new();
/// let ball = kernel.create_sphere(1.0).unwrap();
/// let moved = kernel.place_at(&ball, Vector3::new(5.0, 0.0, 0.0));
/// assert_eq!(kernel.bounding_box(&moved).center().x, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitKernel {
    resolution: usize,
}

impl Default for ImplicitKernel {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl ImplicitKernel {
    /// Creates a kernel with the default sampling resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of volume samples per axis.
    ///
    /// Minimum is 2, values below are clamped.
    #[must_use]
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(2);
        self
    }

    /// Samples per axis used by [`GeometryKernel::volume`].
    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }
}

fn check_non_negative(
    operation: &'static str,
    parameter: &'static str,
    value: f64,
) -> KernelResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(KernelError::invalid(operation, parameter, value))
    }
}

fn check_positive(
    operation: &'static str,
    parameter: &'static str,
    value: f64,
) -> KernelResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KernelError::invalid(operation, parameter, value))
    }
}

/// Parts of a solid as seen by a union: unions are flattened.
fn union_parts(solid: &ImplicitSolid) -> Vec<ImplicitSolid> {
    match solid.shape() {
        Shape::Union(parts) => parts.clone(),
        _ => vec![solid.clone()],
    }
}

impl GeometryKernel for ImplicitKernel {
    type Solid = ImplicitSolid;

    fn create_box(&self, size: Vector3<f64>) -> KernelResult<ImplicitSolid> {
        check_positive("create_box", "dx", size.x)?;
        check_positive("create_box", "dy", size.y)?;
        check_positive("create_box", "dz", size.z)?;
        Ok(ImplicitSolid::new(Shape::Cuboid { half: size * 0.5 }))
    }

    fn create_sphere(&self, radius: f64) -> KernelResult<ImplicitSolid> {
        check_non_negative("create_sphere", "radius", radius)?;
        Ok(ImplicitSolid::new(Shape::Sphere { radius }))
    }

    fn create_cylinder(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        length: f64,
        radius: f64,
    ) -> KernelResult<ImplicitSolid> {
        check_positive("create_cylinder", "length", length)?;
        check_non_negative("create_cylinder", "radius", radius)?;
        let axis = Unit::try_new(direction, f64::EPSILON).ok_or_else(|| {
            KernelError::invalid("create_cylinder", "direction length", direction.norm())
        })?;
        Ok(ImplicitSolid::new(Shape::Cylinder {
            origin,
            axis,
            length,
            radius,
        }))
    }

    fn create_polygon_extrusion(
        &self,
        plane: &Plane,
        points: &[Point2<f64>],
        thickness: f64,
    ) -> KernelResult<ImplicitSolid> {
        if points.len() < 3 {
            return Err(KernelError::invalid(
                "create_polygon_extrusion",
                "point count",
                points.len() as f64,
            ));
        }
        check_non_negative("create_polygon_extrusion", "thickness", thickness)?;
        Ok(ImplicitSolid::new(Shape::Prism {
            plane: *plane,
            polygon: points.to_vec(),
            half_thickness: thickness / 2.0,
        }))
    }

    fn boolean_union(&self, a: &ImplicitSolid, b: &ImplicitSolid) -> KernelResult<ImplicitSolid> {
        let mut parts = union_parts(a);
        parts.extend(union_parts(b));
        Ok(ImplicitSolid::new(Shape::Union(parts)))
    }

    fn boolean_intersect(
        &self,
        a: &ImplicitSolid,
        b: &ImplicitSolid,
    ) -> KernelResult<ImplicitSolid> {
        Ok(ImplicitSolid::new(Shape::Intersection(a.clone(), b.clone())))
    }

    fn fillet_edges(
        &self,
        solid: &ImplicitSolid,
        selection: &Aabb,
        radius: f64,
    ) -> KernelResult<ImplicitSolid> {
        check_positive("fillet_edges", "radius", radius)?;
        if !solid.bounds().intersects(selection) {
            return Err(KernelError::EmptySelection {
                operation: "fillet_edges",
            });
        }
        match solid.shape() {
            Shape::Union(parts) => Ok(ImplicitSolid::new(Shape::Blend {
                parts: parts.clone(),
                radius,
                region: *selection,
            })),
            // a single primitive has no junction edges to blend
            _ => {
                debug!("fillet_edges: solid has no union edges, left unchanged");
                Ok(solid.clone())
            }
        }
    }

    #[allow(clippy::float_cmp)]
    fn offset_shell(
        &self,
        solid: &ImplicitSolid,
        inner: f64,
        outer: f64,
    ) -> KernelResult<ImplicitSolid> {
        check_non_negative("offset_shell", "inner thickness", inner)?;
        check_non_negative("offset_shell", "outer thickness", outer)?;
        if inner == 0.0 && outer == 0.0 {
            return Err(KernelError::invalid("offset_shell", "total thickness", 0.0));
        }
        Ok(ImplicitSolid::new(Shape::Shell {
            inner: solid.clone(),
            inward: inner,
            outward: outer,
        }))
    }

    fn bounding_box(&self, solid: &ImplicitSolid) -> Aabb {
        solid.bounds()
    }

    fn volume(&self, solid: &ImplicitSolid) -> f64 {
        let bounds = solid.bounds();
        if bounds.is_empty() || bounds.volume() <= 0.0 {
            return 0.0;
        }
        let n = self.resolution;
        let step = bounds.size() / n as f64;
        let mut inside = 0_usize;
        for i in 0..n {
            let x = (i as f64 + 0.5).mul_add(step.x, bounds.min.x);
            for j in 0..n {
                let y = (j as f64 + 0.5).mul_add(step.y, bounds.min.y);
                for k in 0..n {
                    let z = (k as f64 + 0.5).mul_add(step.z, bounds.min.z);
                    if solid.contains(&Point3::new(x, y, z)) {
                        inside += 1;
                    }
                }
            }
        }
        inside as f64 * step.x * step.y * step.z
    }

    fn place_at(&self, solid: &ImplicitSolid, translation: Vector3<f64>) -> ImplicitSolid {
        let (inner, offset) = match solid.shape() {
            Shape::Translated { inner, offset } => (inner.clone(), offset + translation),
            _ => (solid.clone(), translation),
        };
        ImplicitSolid::new(Shape::Translated { inner, offset })
    }

    fn compound(&self, parts: Vec<ImplicitSolid>) -> KernelResult<ImplicitSolid> {
        if parts.is_empty() {
            return Err(KernelError::EmptyInput {
                operation: "compound",
            });
        }
        Ok(ImplicitSolid::new(Shape::Compound(parts)))
    }
}
