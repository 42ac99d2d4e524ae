//! Recording kernel test double.
//!
//! Solids are their bounding boxes. Every call is logged so tests can check
//! the exact primitive sequence a build issues.

use std::cell::RefCell;

use lattice_kernel::{GeometryKernel, KernelError, KernelResult};
use lattice_types::{Aabb, Plane, Point2};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Box(Vector3<f64>),
    Sphere(f64),
    Cylinder {
        origin: Point3<f64>,
        direction: Vector3<f64>,
        length: f64,
        radius: f64,
    },
    Extrusion {
        points: usize,
        thickness: f64,
    },
    Union,
    Intersect,
    Fillet(f64),
    Shell(f64, f64),
    PlaceAt(Vector3<f64>),
    Compound(usize),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingKernel {
    calls: RefCell<Vec<Call>>,
    fail_on: Option<&'static str>,
}

impl RecordingKernel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Kernel whose `operation` always fails.
    pub(crate) fn failing(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, operation: &'static str, call: Call) -> KernelResult<()> {
        self.calls.borrow_mut().push(call);
        if self.fail_on == Some(operation) {
            return Err(KernelError::invalid(operation, "test", 0.0));
        }
        Ok(())
    }
}

impl GeometryKernel for RecordingKernel {
    type Solid = Aabb;

    fn create_box(&self, size: Vector3<f64>) -> KernelResult<Aabb> {
        self.record("create_box", Call::Box(size))?;
        Ok(Aabb::centered(size))
    }

    fn create_sphere(&self, radius: f64) -> KernelResult<Aabb> {
        self.record("create_sphere", Call::Sphere(radius))?;
        Ok(Aabb::centered(Vector3::repeat(2.0 * radius)))
    }

    fn create_cylinder(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        length: f64,
        radius: f64,
    ) -> KernelResult<Aabb> {
        self.record(
            "create_cylinder",
            Call::Cylinder {
                origin,
                direction,
                length,
                radius,
            },
        )?;
        let end = origin + direction.normalize() * length;
        Ok(Aabb::from_points([origin, end].iter()).expanded(radius))
    }

    fn create_polygon_extrusion(
        &self,
        plane: &Plane,
        points: &[Point2<f64>],
        thickness: f64,
    ) -> KernelResult<Aabb> {
        self.record(
            "create_polygon_extrusion",
            Call::Extrusion {
                points: points.len(),
                thickness,
            },
        )?;
        let lifted: Vec<_> = points.iter().map(|p| plane.lift(p)).collect();
        Ok(Aabb::from_points(lifted.iter()).expanded(thickness / 2.0))
    }

    fn boolean_union(&self, a: &Aabb, b: &Aabb) -> KernelResult<Aabb> {
        self.record("boolean_union", Call::Union)?;
        Ok(a.union(b))
    }

    fn boolean_intersect(&self, a: &Aabb, b: &Aabb) -> KernelResult<Aabb> {
        self.record("boolean_intersect", Call::Intersect)?;
        Ok(a.intersection(b))
    }

    fn fillet_edges(&self, solid: &Aabb, _selection: &Aabb, radius: f64) -> KernelResult<Aabb> {
        self.record("fillet_edges", Call::Fillet(radius))?;
        Ok(*solid)
    }

    fn offset_shell(&self, solid: &Aabb, inner: f64, outer: f64) -> KernelResult<Aabb> {
        self.record("offset_shell", Call::Shell(inner, outer))?;
        Ok(solid.expanded(outer))
    }

    fn bounding_box(&self, solid: &Aabb) -> Aabb {
        *solid
    }

    fn volume(&self, solid: &Aabb) -> f64 {
        if solid.is_empty() {
            0.0
        } else {
            solid.volume()
        }
    }

    fn place_at(&self, solid: &Aabb, translation: Vector3<f64>) -> Aabb {
        self.calls.borrow_mut().push(Call::PlaceAt(translation));
        solid.translated(&translation)
    }

    fn compound(&self, parts: Vec<Aabb>) -> KernelResult<Aabb> {
        self.record("compound", Call::Compound(parts.len()))?;
        if parts.is_empty() {
            return Err(KernelError::EmptyInput {
                operation: "compound",
            });
        }
        Ok(parts.iter().fold(Aabb::empty(), |acc, p| acc.union(p)))
    }
}
