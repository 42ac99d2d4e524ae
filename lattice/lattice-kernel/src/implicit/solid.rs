//! Signed distance solids.
//!
//! Distances of booleans are the usual min/max bounds, not exact Euclidean
//! distances; only their sign is relied upon, except inside blends and
//! shells where the primitive distances are close to exact.

use std::sync::Arc;

use lattice_types::{Aabb, Plane, Point2};
use nalgebra::{Point3, Unit, Vector3};

/// Shape tree node.
#[derive(Debug)]
pub(crate) enum Shape {
    /// Box centered on the origin.
    Cuboid { half: Vector3<f64> },
    /// Sphere centered on the origin.
    Sphere { radius: f64 },
    Cylinder {
        origin: Point3<f64>,
        axis: Unit<Vector3<f64>>,
        length: f64,
        radius: f64,
    },
    Prism {
        plane: Plane,
        polygon: Vec<Point2<f64>>,
        half_thickness: f64,
    },
    Union(Vec<ImplicitSolid>),
    /// Union whose parts are blended with `radius` inside `region`.
    Blend {
        parts: Vec<ImplicitSolid>,
        radius: f64,
        region: Aabb,
    },
    Intersection(ImplicitSolid, ImplicitSolid),
    Shell {
        inner: ImplicitSolid,
        inward: f64,
        outward: f64,
    },
    Translated {
        inner: ImplicitSolid,
        offset: Vector3<f64>,
    },
    /// Parts kept side by side, never blended.
    Compound(Vec<ImplicitSolid>),
}

/// A solid of the [`ImplicitKernel`](crate::ImplicitKernel).
///
/// Cloning is cheap: the shape tree is shared.
#[derive(Debug, Clone)]
pub struct ImplicitSolid {
    shape: Arc<Shape>,
    bounds: Aabb,
}

impl ImplicitSolid {
    pub(crate) fn new(shape: Shape) -> Self {
        let bounds = shape.bounds();
        Self {
            shape: Arc::new(shape),
            bounds,
        }
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Conservative axis-aligned bounds.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of top-level parts: members of a union, blend or compound,
    /// 1 for anything else.
    #[must_use]
    pub fn part_count(&self) -> usize {
        match self.shape() {
            Shape::Union(parts) | Shape::Compound(parts) | Shape::Blend { parts, .. } => {
                parts.len()
            }
            _ => 1,
        }
    }

    /// Signed distance estimate, negative inside.
    #[must_use]
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        match self.shape() {
            Shape::Cuboid { half } => {
                let q = p.coords.abs() - half;
                q.sup(&Vector3::zeros()).norm() + q.max().min(0.0)
            }
            Shape::Sphere { radius } => p.coords.norm() - radius,
            Shape::Cylinder {
                origin,
                axis,
                length,
                radius,
            } => {
                let v = p - origin;
                let t = v.dot(&**axis);
                let radial = (v - axis.into_inner() * t).norm();
                combine_extrusion(radial - radius, (t - length / 2.0).abs() - length / 2.0)
            }
            Shape::Prism {
                plane,
                polygon,
                half_thickness,
            } => {
                let in_plane = polygon_distance(&plane.project(p), polygon);
                combine_extrusion(in_plane, plane.height(p).abs() - half_thickness)
            }
            Shape::Union(parts) | Shape::Compound(parts) => parts
                .iter()
                .map(|part| part.distance(p))
                .fold(f64::INFINITY, f64::min),
            Shape::Blend {
                parts,
                radius,
                region,
            } => {
                let mut distances = parts.iter().map(|part| part.distance(p));
                let first = distances.next().unwrap_or(f64::INFINITY);
                if region.contains(p) {
                    distances.fold(first, |a, b| smooth_min(a, b, *radius))
                } else {
                    distances.fold(first, f64::min)
                }
            }
            Shape::Intersection(a, b) => a.distance(p).max(b.distance(p)),
            Shape::Shell {
                inner,
                inward,
                outward,
            } => {
                let d = inner.distance(p);
                (d - outward).max(-d - inward)
            }
            Shape::Translated { inner, offset } => inner.distance(&(p - offset)),
        }
    }

    /// Returns true if `p` lies strictly inside the solid.
    #[must_use]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        match self.shape() {
            Shape::Union(parts) | Shape::Compound(parts) => {
                parts.iter().any(|part| part.contains(p))
            }
            Shape::Intersection(a, b) => a.contains(p) && b.contains(p),
            Shape::Translated { inner, offset } => inner.contains(&(p - offset)),
            _ => self.distance(p) < 0.0,
        }
    }
}

impl Shape {
    fn bounds(&self) -> Aabb {
        match self {
            Self::Cuboid { half } => Aabb::centered(half * 2.0),
            Self::Sphere { radius } => Aabb::centered(Vector3::repeat(radius * 2.0)),
            Self::Cylinder {
                origin,
                axis,
                length,
                radius,
            } => {
                let end = origin + axis.into_inner() * *length;
                Aabb::from_points([*origin, end].iter()).expanded(*radius)
            }
            Self::Prism {
                plane,
                polygon,
                half_thickness,
            } => {
                let lift = plane.normal.into_inner() * *half_thickness;
                let mut bounds = Aabb::empty();
                for point in polygon.iter().map(|uv| plane.lift(uv)) {
                    bounds.expand_to_include(&(point + lift));
                    bounds.expand_to_include(&(point - lift));
                }
                bounds
            }
            Self::Union(parts) | Self::Compound(parts) => union_bounds(parts),
            // smooth_min lowers distances by at most radius / 4
            Self::Blend { parts, radius, .. } => union_bounds(parts).expanded(radius * 0.25),
            Self::Intersection(a, b) => a.bounds.intersection(&b.bounds),
            Self::Shell { inner, outward, .. } => inner.bounds.expanded(*outward),
            Self::Translated { inner, offset } => inner.bounds.translated(offset),
        }
    }
}

fn union_bounds(parts: &[ImplicitSolid]) -> Aabb {
    parts
        .iter()
        .fold(Aabb::empty(), |acc, part| acc.union(&part.bounds))
}

/// Combines an in-section distance with an along-axis distance.
fn combine_extrusion(section: f64, along: f64) -> f64 {
    let outside = section.max(0.0).hypot(along.max(0.0));
    outside + section.max(along).min(0.0)
}

/// Polynomial smooth minimum with blend radius `k`.
fn smooth_min(a: f64, b: f64, k: f64) -> f64 {
    let h = (k - (a - b).abs()).max(0.0) / k;
    a.min(b) - h * h * k * 0.25
}

/// Signed distance to a closed polygon, negative inside.
fn polygon_distance(p: &Point2<f64>, polygon: &[Point2<f64>]) -> f64 {
    let Some(last) = polygon.last() else {
        return f64::INFINITY;
    };
    let mut best = f64::INFINITY;
    let mut inside = false;
    let mut previous = last;
    for current in polygon {
        let edge = previous - current;
        let w = p - current;
        let span = edge.norm_squared();
        let t = if span > 0.0 {
            (w.dot(&edge) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        best = best.min((w - edge * t).norm_squared());

        // crossing test of the edge against a ray towards +x
        let above = p.y >= current.y;
        let below = p.y < previous.y;
        let left = edge.x * w.y > edge.y * w.x;
        if (above && below && left) || (!above && !below && !left) {
            inside = !inside;
        }
        previous = current;
    }
    if inside {
        -best.sqrt()
    } else {
        best.sqrt()
    }
}
