//! Resolved entities.

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;
use lattice_types::{CornerSet, Point3};
use smallvec::SmallVec;

use crate::descriptor::{AttributeKey, AttributeValue, Descriptor};
use crate::error::{TopologyError, TopologyResult};

/// Resolved points of one entity. Nodes, struts and quad faces stay inline.
pub type Points = SmallVec<[Point3<f64>; 4]>;

/// Classification of an entity by its resolved point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Edge fillet request, no points.
    Fillet,
    /// Sphere at one point.
    Node,
    /// Cylinder between two points.
    Strut,
    /// Extruded polygon through three or more points.
    Face,
}

impl EntityKind {
    /// The only attribute key this kind accepts.
    #[must_use]
    pub const fn accepted_key(self) -> AttributeKey {
        match self {
            Self::Fillet => AttributeKey::Radius,
            Self::Node | Self::Strut => AttributeKey::Diameter,
            Self::Face => AttributeKey::Thickness,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fillet => "fillet",
            Self::Node => "node",
            Self::Strut => "strut",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A descriptor resolved against a corner set and a variable table.
///
/// Entities are immutable: changing the corners or the variables means
/// resolving the descriptor again.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use lattice_topology::{AttributeKey, Descriptor, Entity, EntityKind};
/// use lattice_types::{CellSize, CornerSet};
///
/// let corners = CornerSet::from_size(CellSize::cubic(2.0));
/// let strut: Descriptor = "[1, 7, {'diameter': 0.4}]".parse().unwrap();
/// let entity = Entity::resolve(strut, &corners, &BTreeMap::new()).unwrap();
///
/// assert_eq!(entity.kind(), EntityKind::Strut);
/// assert_eq!(entity.dimension(), 1);
/// assert_eq!(entity.attribute(AttributeKey::Diameter).unwrap(), 0.4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    descriptor: Descriptor,
    kind: EntityKind,
    points: Points,
    attributes: HashMap<AttributeKey, f64>,
}

impl Entity {
    /// Resolves a fillet or geometry descriptor.
    ///
    /// Attribute values naming a variable are replaced by the variable's
    /// value from `variables`.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::InvalidDescriptor`] for `var` and `template`
    ///   descriptors, which do not describe entities
    /// - [`TopologyError::IndexOutOfRange`] for corners outside 1..=8
    /// - [`TopologyError::UnknownAttribute`] for a key the entity kind does
    ///   not accept
    /// - [`TopologyError::UnboundVariable`] for an unregistered variable
    pub fn resolve(
        descriptor: Descriptor,
        corners: &CornerSet,
        variables: &BTreeMap<String, f64>,
    ) -> TopologyResult<Self> {
        let (kind, points) = match &descriptor {
            Descriptor::Fillet { .. } => (EntityKind::Fillet, Points::new()),
            Descriptor::Geometry { refs, .. } => {
                let points = refs
                    .iter()
                    .map(|r| r.point(corners))
                    .collect::<TopologyResult<Points>>()?;
                let kind = match points.len() {
                    0 => return Err(TopologyError::invalid(&descriptor, "no node references")),
                    1 => EntityKind::Node,
                    2 => EntityKind::Strut,
                    _ => EntityKind::Face,
                };
                (kind, points)
            }
            Descriptor::Var { .. } | Descriptor::Template { .. } => {
                return Err(TopologyError::invalid(&descriptor, "not an entity descriptor"));
            }
        };

        let mut attributes = HashMap::new();
        for (key, value) in descriptor.attributes() {
            if *key != kind.accepted_key() {
                return Err(TopologyError::UnknownAttribute {
                    key: key.name().to_owned(),
                    kind: kind.name(),
                });
            }
            let resolved = match value {
                AttributeValue::Number(x) => *x,
                AttributeValue::Variable(name) => *variables
                    .get(name)
                    .ok_or_else(|| TopologyError::UnboundVariable(name.clone()))?,
            };
            attributes.insert(*key, resolved);
        }

        Ok(Self {
            descriptor,
            kind,
            points,
            attributes,
        })
    }

    /// Node, strut, face or fillet.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Number of resolved points minus one; `-1` for a fillet.
    #[must_use]
    pub fn dimension(&self) -> i32 {
        i32::try_from(self.points.len()).map_or(i32::MAX, |n| n - 1)
    }

    /// Resolved points in descriptor order.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// The descriptor this entity was resolved from.
    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Returns true if the attribute was declared.
    #[must_use]
    pub fn has(&self, key: AttributeKey) -> bool {
        self.attributes.contains_key(&key)
    }

    /// Attribute value, if declared.
    #[must_use]
    pub fn get(&self, key: AttributeKey) -> Option<f64> {
        self.attributes.get(&key).copied()
    }

    /// Attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::AttributeMissing`] if the attribute was not
    /// declared.
    pub fn attribute(&self, key: AttributeKey) -> TopologyResult<f64> {
        self.get(key)
            .ok_or(TopologyError::AttributeMissing(key.name()))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeRef, Weights};
    use approx::assert_relative_eq;
    use lattice_types::{CellSize, CornerIndex};
    use proptest::prelude::*;

    fn corners() -> CornerSet {
        CornerSet::from_size(CellSize::new(2.0, 4.0, 6.0))
    }

    fn resolve(text: &str) -> TopologyResult<Entity> {
        Entity::resolve(text.parse()?, &corners(), &BTreeMap::new())
    }

    #[test]
    fn test_kinds_and_dimensions() {
        let node = resolve("[1, {'diameter': 0.5}]").unwrap();
        assert_eq!(node.kind(), EntityKind::Node);
        assert_eq!(node.dimension(), 0);

        let strut = resolve("[1, 7, {'diameter': 0.5}]").unwrap();
        assert_eq!(strut.kind(), EntityKind::Strut);
        assert_eq!(strut.dimension(), 1);

        let face = resolve("[1, 2, 3, 4, {'thickness': 0.1}]").unwrap();
        assert_eq!(face.kind(), EntityKind::Face);
        assert_eq!(face.dimension(), 3);
        assert_eq!(face.points().len(), 4);

        let fillet = resolve("['fillet', {'radius': 0.2}]").unwrap();
        assert_eq!(fillet.kind(), EntityKind::Fillet);
        assert_eq!(fillet.dimension(), -1);
        assert!(fillet.points().is_empty());
    }

    #[test]
    fn test_midpoint_relation() {
        let e = resolve("[(1, 7), {'diameter': 0.1}]").unwrap();
        assert_relative_eq!(e.points()[0], Point3::origin());
        let e = resolve("[(1, 4), {'diameter': 0.1}]").unwrap();
        assert_relative_eq!(e.points()[0], Point3::new(0.0, -2.0, -3.0));
    }

    #[test]
    fn test_attributes() {
        let e = resolve("[1, 7, {'diameter': 0.4}]").unwrap();
        assert!(e.has(AttributeKey::Diameter));
        assert_eq!(e.get(AttributeKey::Diameter), Some(0.4));
        assert_eq!(e.get(AttributeKey::Thickness), None);
        assert!(matches!(
            e.attribute(AttributeKey::Thickness),
            Err(TopologyError::AttributeMissing("thickness"))
        ));

        let bare = resolve("[1, 7]").unwrap();
        assert!(matches!(
            bare.attribute(AttributeKey::Diameter),
            Err(TopologyError::AttributeMissing("diameter"))
        ));
    }

    #[test]
    fn test_rejects_wrong_key_for_kind() {
        assert!(matches!(
            resolve("[1, 7, {'thickness': 0.4}]"),
            Err(TopologyError::UnknownAttribute { kind: "strut", .. })
        ));
        assert!(matches!(
            resolve("[1, 2, 3, {'diameter': 0.4}]"),
            Err(TopologyError::UnknownAttribute { kind: "face", .. })
        ));
        assert!(matches!(
            resolve("['fillet', {'diameter': 0.4}]"),
            Err(TopologyError::UnknownAttribute { kind: "fillet", .. })
        ));
    }

    #[test]
    fn test_variable_binding() {
        let mut variables = BTreeMap::new();
        variables.insert("d".to_owned(), 0.3);
        let descriptor: Descriptor = "[1, 7, {'diameter': 'd'}]".parse().unwrap();
        let e = Entity::resolve(descriptor.clone(), &corners(), &variables).unwrap();
        assert_eq!(e.attribute(AttributeKey::Diameter).unwrap(), 0.3);
        // the descriptor keeps the variable name
        assert_eq!(e.to_string(), "[1, 7, {'diameter': 'd'}]");

        assert!(matches!(
            Entity::resolve(descriptor, &corners(), &BTreeMap::new()),
            Err(TopologyError::UnboundVariable(name)) if name == "d"
        ));
    }

    #[test]
    fn test_non_entity_descriptors() {
        assert!(matches!(
            resolve("['var', {'name': 'd', 'value': 1}]"),
            Err(TopologyError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            resolve("['template', {'filepath': 'x'}]"),
            Err(TopologyError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_out_of_range_corner() {
        assert!(matches!(
            resolve("[1, 9, {'diameter': 0.1}]"),
            Err(TopologyError::IndexOutOfRange { index: 9, .. })
        ));
        assert!(matches!(
            resolve("[0, {'diameter': 0.1}]"),
            Err(TopologyError::IndexOutOfRange { index: 0, .. })
        ));
    }

    fn label() -> impl Strategy<Value = i64> {
        1_i64..=8
    }

    proptest! {
        #[test]
        fn prop_corner_reference_is_exact(a in label()) {
            let set = corners();
            let e = Entity::resolve(
                Descriptor::geometry(vec![NodeRef::Corner(a)], Vec::new()),
                &set,
                &BTreeMap::new(),
            ).unwrap();
            let index = CornerIndex::new(a).unwrap();
            prop_assert_eq!(e.points()[0], set.get(index));
        }

        #[test]
        fn prop_pair_is_midpoint(a in label(), b in label()) {
            let set = corners();
            let p = NodeRef::relation(a, b, Weights::Midpoint).point(&set).unwrap();
            let pa = NodeRef::Corner(a).point(&set).unwrap();
            let pb = NodeRef::Corner(b).point(&set).unwrap();
            prop_assert!((p - nalgebra::center(&pa, &pb)).norm() < 1e-12);
        }

        #[test]
        fn prop_split_is_convex_combination(a in label(), b in label(), t in 0.0_f64..=1.0) {
            let set = corners();
            let p = NodeRef::relation(a, b, Weights::Split(t)).point(&set).unwrap();
            let pa = NodeRef::Corner(a).point(&set).unwrap();
            let pb = NodeRef::Corner(b).point(&set).unwrap();
            let expected = pa.coords * t + pb.coords * (1.0 - t);
            prop_assert!((p.coords - expected).norm() < 1e-12);
        }

        #[test]
        fn prop_resolution_is_idempotent(a in label(), b in label(), t in 0.0_f64..=1.0) {
            let set = corners();
            let descriptor = Descriptor::geometry(
                vec![NodeRef::relation(a, b, Weights::Split(t)), NodeRef::Corner(b)],
                vec![(AttributeKey::Diameter, AttributeValue::Number(0.1))],
            );
            let first = Entity::resolve(descriptor.clone(), &set, &BTreeMap::new()).unwrap();
            let second = Entity::resolve(descriptor, &set, &BTreeMap::new()).unwrap();
            prop_assert_eq!(first.dimension(), second.dimension());
            prop_assert_eq!(first.points(), second.points());
        }
    }
}
