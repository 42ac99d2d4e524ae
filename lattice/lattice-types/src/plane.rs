//! Oriented plane frames.

use nalgebra::{Point2, Point3, Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A plane with an in-plane coordinate frame.
///
/// `y_dir` completes the right-handed frame `(x_dir, y_dir, normal)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Origin of the in-plane coordinates.
    pub origin: Point3<f64>,
    /// Unit normal.
    pub normal: Unit<Vector3<f64>>,
    /// Unit in-plane x direction, perpendicular to `normal`.
    pub x_dir: Unit<Vector3<f64>>,
}

impl Plane {
    /// Plane through three points.
    ///
    /// The normal is `(p1 - p0) × (p2 - p1)` and the x direction points from
    /// `p0` to `p1`. Returns `None` when the points are (nearly) collinear.
    ///
    /// # Example
    ///
    /// ```
    /// use lattice_types::{Plane, Point3, Vector3};
    ///
    /// let plane = Plane::through(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    /// )
    /// .unwrap();
    /// assert_eq!(plane.normal.into_inner(), Vector3::z());
    /// ```
    #[must_use]
    pub fn through(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) -> Option<Self> {
        let edge = p1 - p0;
        let normal = Unit::try_new(edge.cross(&(p2 - p1)), f64::EPSILON)?;
        let x_dir = Unit::try_new(edge, f64::EPSILON)?;
        Some(Self {
            origin: p0,
            normal,
            x_dir,
        })
    }

    /// Unit in-plane y direction, `normal × x_dir`.
    #[must_use]
    pub fn y_dir(&self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.normal.cross(&*self.x_dir))
    }

    /// Projects a point into in-plane coordinates.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        let d = point - self.origin;
        Point2::new(d.dot(&*self.x_dir), d.dot(&*self.y_dir()))
    }

    /// Lifts in-plane coordinates back into space.
    #[must_use]
    pub fn lift(&self, point: &Point2<f64>) -> Point3<f64> {
        self.origin + self.x_dir.into_inner() * point.x + self.y_dir().into_inner() * point.y
    }

    /// Signed distance of a point along the normal.
    #[must_use]
    pub fn height(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&*self.normal)
    }
}
