//! Unit cell assembly.

use lattice_kernel::GeometryKernel;
use lattice_topology::{AttributeKey, CellConfiguration, Entity, EntityKind};
use lattice_types::{CellSize, CornerSet, Plane, Point2};
use tracing::{debug, info, warn};

use crate::error::{KernelContext, LatticeError, LatticeResult};

/// Shortest strut accepted, relative to the cell diagonal.
const MIN_STRUT_LENGTH: f64 = 1e-9;

/// The geometry of one unit cell, built from a [`CellConfiguration`].
///
/// The cell is centered on the origin; its corners follow the numbering of
/// [`CornerSet::from_size`]. Unless clipping is disabled, the assembled
/// geometry is intersected with the nominal `dx × dy × dz` box so that tiled
/// cells meet exactly at their shared faces.
///
/// # Example
///
/// ```
/// use lattice_kernel::ImplicitKernel;
/// use lattice_tiling::UnitaryCell;
/// use lattice_topology::CellConfiguration;
/// use lattice_types::CellSize;
///
/// let kernel = ImplicitKernel::new().with_resolution(32);
/// let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
/// let config = CellConfiguration::parse("[1, 7, {'diameter': 0.4}]", *cell.corners()).unwrap();
///
/// cell.create(&kernel, &config).unwrap();
/// let density = cell.density(&kernel).unwrap();
/// assert!(density > 0.0 && density < 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct UnitaryCell<S> {
    size: CellSize,
    corners: CornerSet,
    clip_to_box: bool,
    geometry: Option<S>,
}

impl<S> Default for UnitaryCell<S> {
    /// An uninitialized cell of zero size.
    fn default() -> Self {
        let size = CellSize::default();
        Self {
            size,
            corners: CornerSet::from_size(size),
            clip_to_box: true,
            geometry: None,
        }
    }
}

impl<S: Clone> UnitaryCell<S> {
    /// Creates an unbuilt cell of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvalidCellSize`] unless every component is
    /// positive and finite.
    pub fn new(size: CellSize) -> LatticeResult<Self> {
        if !size.is_valid() {
            return Err(LatticeError::InvalidCellSize {
                dx: size.dx,
                dy: size.dy,
                dz: size.dz,
            });
        }
        Ok(Self {
            size,
            corners: CornerSet::from_size(size),
            ..Self::default()
        })
    }

    /// Enables or disables clipping to the nominal cell box.
    #[must_use]
    pub const fn with_clipping(mut self, enabled: bool) -> Self {
        self.clip_to_box = enabled;
        self
    }

    /// Returns true if the cell has a size.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.size.is_zero()
    }

    /// Returns true once geometry has been built.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.geometry.is_some()
    }

    /// Nominal cell size.
    #[must_use]
    pub const fn size(&self) -> CellSize {
        self.size
    }

    /// Corner coordinates derived from the size.
    #[must_use]
    pub const fn corners(&self) -> &CornerSet {
        &self.corners
    }

    /// Whether the geometry is clipped to the nominal box.
    #[must_use]
    pub const fn clips_to_box(&self) -> bool {
        self.clip_to_box
    }

    /// The built geometry.
    #[must_use]
    pub const fn geometry(&self) -> Option<&S> {
        self.geometry.as_ref()
    }

    /// Builds the cell geometry from `config`.
    ///
    /// Entities are processed in order. Nodes become spheres, struts
    /// cylinders and faces extruded polygons; their unions are deferred until
    /// a fillet needs the merged solid, or until the end. A fillet rounds
    /// every edge inside the cell box of the geometry accumulated so far.
    ///
    /// On error the previously built geometry, if any, is kept.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::NotInitialized`] if the cell has no size
    /// - [`LatticeError::NoTopology`] if `config` yields no solid
    /// - [`LatticeError::DegenerateEntity`] for coincident strut endpoints or
    ///   collinear face points
    /// - [`LatticeError::Topology`] for a missing attribute
    /// - [`LatticeError::KernelFailure`] if a kernel operation fails
    pub fn create<K>(&mut self, kernel: &K, config: &CellConfiguration) -> LatticeResult<()>
    where
        K: GeometryKernel<Solid = S>,
    {
        if !self.is_initialized() {
            return Err(LatticeError::NotInitialized("unit cell"));
        }
        if config.is_empty() {
            return Err(LatticeError::NoTopology);
        }

        info!(
            "Building unit cell {:?} from {} entities",
            self.size.to_vector().as_slice(),
            config.len()
        );

        let mut merged: Option<S> = None;
        let mut pending: Vec<S> = Vec::new();
        for (index, entity) in config.iter().enumerate() {
            debug!("Entity {}: {} {}", index, entity.kind(), entity);
            match entity.kind() {
                EntityKind::Fillet => {
                    let radius = entity.attribute(AttributeKey::Radius)?;
                    merged = merge(kernel, merged, pending.drain(..))?;
                    match merged.take() {
                        Some(solid) => {
                            let filleted = kernel
                                .fillet_edges(&solid, &self.corners.bounds(), radius)
                                .context("fillet", "fillet radius")?;
                            merged = Some(filleted);
                        }
                        None => warn!("Fillet at entity {} precedes every solid, ignored", index),
                    }
                }
                EntityKind::Node => pending.push(node(kernel, entity)?),
                EntityKind::Strut => pending.push(self.strut(kernel, index, entity)?),
                EntityKind::Face => pending.push(face(kernel, index, entity)?),
            }
        }

        let merged = merge(kernel, merged, pending)?.ok_or(LatticeError::NoTopology)?;
        let geometry = if self.clip_to_box {
            let bounds = kernel
                .create_box(self.size.to_vector())
                .context("clip to cell box", "cell size")?;
            kernel
                .boolean_intersect(&merged, &bounds)
                .context("clip to cell box", "cell size")?
        } else {
            merged
        };

        self.geometry = Some(geometry);
        info!("Unit cell built");
        Ok(())
    }

    fn strut<K>(&self, kernel: &K, index: usize, entity: &Entity) -> LatticeResult<S>
    where
        K: GeometryKernel<Solid = S>,
    {
        let radius = entity.attribute(AttributeKey::Diameter)? / 2.0;
        let [first, last] = [entity.points()[0], entity.points()[1]];
        let axis = last - first;
        let length = axis.norm();
        if length <= MIN_STRUT_LENGTH * self.size.to_vector().norm() {
            return Err(LatticeError::DegenerateEntity {
                index,
                reason: "strut endpoints coincide",
            });
        }
        kernel
            .create_cylinder(first, axis / length, length, radius)
            .context("strut", "strut diameter")
    }

    /// Relative density: built volume over nominal cell volume.
    ///
    /// Returns `None` if the cell has not been built.
    pub fn density<K>(&self, kernel: &K) -> Option<f64>
    where
        K: GeometryKernel<Solid = S>,
    {
        self.geometry
            .as_ref()
            .map(|solid| kernel.volume(solid) / self.size.volume())
    }

    /// Drops the built geometry, keeping the size.
    pub fn clear_geometry(&mut self) {
        self.geometry = None;
    }

    /// Returns the cell to the uninitialized state.
    pub fn reset(&mut self) {
        *self = Self {
            clip_to_box: self.clip_to_box,
            ..Self::default()
        };
    }
}

fn node<K: GeometryKernel>(kernel: &K, entity: &Entity) -> LatticeResult<K::Solid> {
    let radius = entity.attribute(AttributeKey::Diameter)? / 2.0;
    let sphere = kernel
        .create_sphere(radius)
        .context("node", "node diameter")?;
    Ok(kernel.place_at(&sphere, entity.points()[0].coords))
}

fn face<K: GeometryKernel>(kernel: &K, index: usize, entity: &Entity) -> LatticeResult<K::Solid> {
    let thickness = entity.attribute(AttributeKey::Thickness)?;
    let points = entity.points();
    let plane = Plane::through(points[0], points[1], points[2]).ok_or(
        LatticeError::DegenerateEntity {
            index,
            reason: "first three face points are collinear",
        },
    )?;
    let polygon: Vec<Point2<f64>> = points.iter().map(|p| plane.project(p)).collect();
    kernel
        .create_polygon_extrusion(&plane, &polygon, thickness)
        .context("face", "face thickness")
}

/// Unions `pending` into `merged`.
fn merge<K: GeometryKernel>(
    kernel: &K,
    merged: Option<K::Solid>,
    pending: impl IntoIterator<Item = K::Solid>,
) -> LatticeResult<Option<K::Solid>> {
    let mut acc = merged;
    for solid in pending {
        acc = Some(match acc {
            Some(current) => kernel
                .boolean_union(&current, &solid)
                .context("union", "entity dimensions")?,
            None => solid,
        });
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingKernel};
    use approx::assert_relative_eq;
    use lattice_kernel::{ImplicitKernel, ImplicitSolid};
    use lattice_types::{Aabb, Point3, Vector3};

    fn config_for<S: Clone>(cell: &UnitaryCell<S>, text: &str) -> CellConfiguration {
        CellConfiguration::parse(text, *cell.corners()).unwrap()
    }

    #[test]
    fn test_default_is_uninitialized() {
        let mut cell = UnitaryCell::<Aabb>::default();
        assert!(!cell.is_initialized());
        let config = CellConfiguration::parse(
            "[1, 7, {'diameter': 0.4}]",
            CornerSet::from_size(CellSize::cubic(2.0)),
        )
        .unwrap();
        assert!(matches!(
            cell.create(&RecordingKernel::new(), &config),
            Err(LatticeError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_invalid_size() {
        assert!(UnitaryCell::<Aabb>::new(CellSize::new(1.0, 0.0, 1.0)).is_err());
        assert!(UnitaryCell::<Aabb>::new(CellSize::new(1.0, 1.0, f64::NAN)).is_err());
        assert!(UnitaryCell::<Aabb>::new(CellSize::new(-1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_empty_configuration_has_no_topology() {
        let mut cell = UnitaryCell::<Aabb>::new(CellSize::cubic(2.0)).unwrap();
        let config = CellConfiguration::with_corners(*cell.corners());
        assert!(matches!(
            cell.create(&RecordingKernel::new(), &config),
            Err(LatticeError::NoTopology)
        ));
        let fillet_only = config_for(&cell, "['fillet', {'radius': 0.1}]");
        assert!(matches!(
            cell.create(&RecordingKernel::new(), &fillet_only),
            Err(LatticeError::NoTopology)
        ));
    }

    #[test]
    fn test_strut_dispatch() {
        let kernel = RecordingKernel::new();
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let config = config_for(&cell, "[1, 7, {'diameter': 0.4}]");
        cell.create(&kernel, &config).unwrap();

        let calls = kernel.calls();
        assert_eq!(calls.len(), 3);
        let Call::Cylinder {
            origin,
            direction,
            length,
            radius,
        } = &calls[0]
        else {
            panic!("expected a cylinder, got {:?}", calls[0]);
        };
        assert_relative_eq!(*origin, Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(direction.norm(), 1.0);
        assert_relative_eq!(*length, 2.0 * 3.0_f64.sqrt());
        assert_relative_eq!(*radius, 0.2);
        assert_eq!(calls[1], Call::Box(Vector3::new(2.0, 2.0, 2.0)));
        assert_eq!(calls[2], Call::Intersect);
        assert!(cell.is_built());
    }

    #[test]
    fn test_node_and_face_dispatch() {
        let kernel = RecordingKernel::new();
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0))
            .unwrap()
            .with_clipping(false);
        let config = config_for(
            &cell,
            "[(1, 7), {'diameter': 0.6}],\n[1, 2, 3, 4, {'thickness': 0.1}]",
        );
        cell.create(&kernel, &config).unwrap();

        let calls = kernel.calls();
        assert_eq!(calls[0], Call::Sphere(0.3));
        assert_eq!(calls[1], Call::PlaceAt(Vector3::zeros()));
        assert_eq!(
            calls[2],
            Call::Extrusion {
                points: 4,
                thickness: 0.1
            }
        );
        assert_eq!(calls[3], Call::Union);
        assert_eq!(calls.len(), 4);
    }

    #[test]
    fn test_unions_are_batched_around_fillets() {
        let kernel = RecordingKernel::new();
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let config = config_for(
            &cell,
            "[1, 7, {'diameter': 0.2}],\n\
             [2, 8, {'diameter': 0.2}],\n\
             ['fillet', {'radius': 0.05}],\n\
             [3, 5, {'diameter': 0.2}],\n\
             [4, 6, {'diameter': 0.2}]",
        );
        cell.create(&kernel, &config).unwrap();

        let order: Vec<&str> = kernel
            .calls()
            .iter()
            .map(|c| match c {
                Call::Cylinder { .. } => "cylinder",
                Call::Union => "union",
                Call::Fillet(_) => "fillet",
                Call::Box(_) => "box",
                Call::Intersect => "intersect",
                _ => "other",
            })
            .collect();
        assert_eq!(
            order,
            [
                "cylinder", "cylinder", "union", "fillet", "cylinder", "cylinder", "union",
                "union", "box", "intersect"
            ]
        );
    }

    #[test]
    fn test_leading_fillet_is_ignored() {
        let kernel = RecordingKernel::new();
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let config = config_for(&cell, "['fillet', {'radius': 0.1}],\n[1, 7, {'diameter': 0.2}]");
        cell.create(&kernel, &config).unwrap();
        assert_eq!(kernel.count(|c| matches!(c, Call::Fillet(_))), 0);
    }

    #[test]
    fn test_degenerate_entities() {
        let kernel = RecordingKernel::new();
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let strut = config_for(&cell, "[1, 1, {'diameter': 0.2}]");
        assert!(matches!(
            cell.create(&kernel, &strut),
            Err(LatticeError::DegenerateEntity { index: 0, .. })
        ));
        let face = config_for(
            &cell,
            "[1, 7, {'diameter': 0.2}],\n[1, (1, 7), 7, {'thickness': 0.1}]",
        );
        assert!(matches!(
            cell.create(&kernel, &face),
            Err(LatticeError::DegenerateEntity { index: 1, .. })
        ));
    }

    #[test]
    fn test_missing_attribute() {
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let config = config_for(&cell, "[1, 7]");
        assert!(matches!(
            cell.create(&RecordingKernel::new(), &config),
            Err(LatticeError::Topology(_))
        ));
    }

    #[test]
    fn test_failed_create_keeps_committed_geometry() {
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0)).unwrap();
        let first = config_for(&cell, "[1, 7, {'diameter': 0.2}]");
        cell.create(&RecordingKernel::new(), &first).unwrap();
        let committed = *cell.geometry().unwrap();

        let second = config_for(
            &cell,
            "[2, 8, {'diameter': 0.2}],\n[3, 5, {'diameter': 0.2}],\n['fillet', {'radius': 0.1}]",
        );
        let failing = RecordingKernel::failing("fillet_edges");
        let err = cell.create(&failing, &second).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::KernelFailure {
                parameter: "fillet radius",
                ..
            }
        ));
        assert_eq!(cell.geometry(), Some(&committed));
    }

    #[test]
    fn test_reset_and_clear() {
        let mut cell = UnitaryCell::new(CellSize::cubic(2.0))
            .unwrap()
            .with_clipping(false);
        let config = config_for(&cell, "[1, 7, {'diameter': 0.2}]");
        cell.create(&RecordingKernel::new(), &config).unwrap();

        cell.clear_geometry();
        assert!(!cell.is_built());
        assert!(cell.is_initialized());

        cell.reset();
        assert!(!cell.is_initialized());
        assert!(!cell.clips_to_box());
        assert!(cell.density(&RecordingKernel::new()).is_none());
    }

    #[test]
    fn test_strut_density_in_implicit_kernel() {
        let kernel = ImplicitKernel::new().with_resolution(48);
        let mut cell = UnitaryCell::<ImplicitSolid>::new(CellSize::cubic(2.0)).unwrap();
        assert_eq!(cell.density(&kernel), None);

        let config = config_for(&cell, "[1, 7, {'diameter': 0.4}]");
        cell.create(&kernel, &config).unwrap();
        let density = cell.density(&kernel).unwrap();
        assert!(density > 0.03 && density < 0.07, "density {density}");

        let bounds = kernel.bounding_box(cell.geometry().unwrap());
        assert!(Aabb::centered(Vector3::repeat(2.0)).encloses(&bounds, 1e-12));
    }

    #[test]
    fn test_zero_diameter_has_zero_density() {
        let kernel = ImplicitKernel::new().with_resolution(16);
        let mut cell = UnitaryCell::<ImplicitSolid>::new(CellSize::cubic(2.0)).unwrap();
        let config = config_for(&cell, "[1, 7, {'diameter': 0.0}]");
        cell.create(&kernel, &config).unwrap();
        assert_relative_eq!(cell.density(&kernel).unwrap(), 0.0);
    }

    #[test]
    fn test_density_bounded_by_clipping() {
        let kernel = ImplicitKernel::new().with_resolution(24);
        let mut cell = UnitaryCell::<ImplicitSolid>::new(CellSize::cubic(1.0)).unwrap();
        let config = config_for(
            &cell,
            "[1, 7, {'diameter': 0.99}],\n[2, 8, {'diameter': 0.99}],\n[(1, 7), {'diameter': 1.5}]",
        );
        cell.create(&kernel, &config).unwrap();
        let density = cell.density(&kernel).unwrap();
        assert!(density <= 1.0 + 1e-12);
        assert!(density > 0.9);
    }
}
