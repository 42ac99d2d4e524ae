//! Typed descriptors.
//!
//! A descriptor is the literal form of one configuration item:
//!
//! | Literal | Descriptor |
//! |---|---|
//! | `[1, 7, {'diameter': 0.4}]` | [`Descriptor::Geometry`] |
//! | `['var', {'name': 'd', 'value': 0.4}]` | [`Descriptor::Var`] |
//! | `['fillet', {'radius': 0.2}]` | [`Descriptor::Fillet`] |
//! | `['template', {'filepath': 'cell.txt'}]` | [`Descriptor::Template`] |
//!
//! Geometry descriptors list node references followed by an attribute map. A
//! node reference is a corner index or a relation tuple `(a, b[, t0[, t1]])`
//! whose members are node references themselves.

use std::fmt;
use std::str::FromStr;

use lattice_types::{CornerIndex, CornerSet, Point3};
use tracing::warn;

use crate::error::{TopologyError, TopologyResult};
use crate::literal::{self, Literal};

const TEMPLATE: &str = "template";
const VAR: &str = "var";
const FILLET: &str = "fillet";

/// Attribute keys understood by entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKey {
    /// Node and strut diameter.
    Diameter,
    /// Face thickness.
    Thickness,
    /// Fillet radius.
    Radius,
}

impl AttributeKey {
    /// Key as written in descriptor text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Diameter => "diameter",
            Self::Thickness => "thickness",
            Self::Radius => "radius",
        }
    }

    /// Looks up a key by its text form.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "diameter" => Some(Self::Diameter),
            "thickness" => Some(Self::Thickness),
            "radius" => Some(Self::Radius),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An attribute value: a number, or the name of a configuration variable
/// bound when the entity is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Literal number.
    Number(f64),
    /// Variable reference.
    Variable(String),
}

impl AttributeValue {
    fn to_literal(&self) -> Literal {
        match self {
            Self::Number(x) => Literal::Float(*x),
            Self::Variable(name) => Literal::Str(name.clone()),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Variable(value.to_owned())
    }
}

/// Attribute map of a descriptor, in source order.
pub type Attributes = Vec<(AttributeKey, AttributeValue)>;

/// Weights of a relation tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weights {
    /// `(a, b)`: the midpoint.
    Midpoint,
    /// `(a, b, t)`: `t·a + (1 − t)·b`.
    Split(f64),
    /// `(a, b, t0, t1)`: `t0·a + t1·b`, not normalized.
    Independent(f64, f64),
}

impl Weights {
    /// The factors `(u, v)` applied to the two members.
    #[must_use]
    pub fn factors(self) -> (f64, f64) {
        match self {
            Self::Midpoint => (0.5, 0.5),
            Self::Split(t) => (t, 1.0 - t),
            Self::Independent(t0, t1) => (t0, t1),
        }
    }
}

/// A node reference: a cell corner or a weighted combination of two nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRef {
    /// Corner label, validated against 1..=8 on resolution.
    Corner(i64),
    /// Weighted combination of two references.
    Relation {
        /// First member.
        a: Box<NodeRef>,
        /// Second member.
        b: Box<NodeRef>,
        /// Weights of `a` and `b`.
        weights: Weights,
    },
}

impl NodeRef {
    /// Relation between two references.
    #[must_use]
    pub fn relation(a: impl Into<NodeRef>, b: impl Into<NodeRef>, weights: Weights) -> Self {
        Self::Relation {
            a: Box::new(a.into()),
            b: Box::new(b.into()),
            weights,
        }
    }

    /// Resolves the reference to coordinates in `corners`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] if any leaf is not a
    /// corner label in 1..=8.
    pub fn point(&self, corners: &CornerSet) -> TopologyResult<Point3<f64>> {
        match self {
            Self::Corner(label) => {
                let index = CornerIndex::new(*label).map_err(|err| {
                    TopologyError::IndexOutOfRange {
                        what: "corner",
                        index: err.0,
                        lower: 1,
                        upper: 8,
                    }
                })?;
                Ok(corners.get(index))
            }
            Self::Relation { a, b, weights } => {
                let (u, v) = weights.factors();
                if matches!(weights, Weights::Independent(..)) && ((u + v) - 1.0).abs() > 1e-9 {
                    warn!("Relation weights ({}, {}) do not sum to 1, point is extrapolated", u, v);
                }
                let pa = a.point(corners)?;
                let pb = b.point(corners)?;
                Ok(Point3::from(pa.coords * u + pb.coords * v))
            }
        }
    }

    fn to_literal(&self) -> Literal {
        match self {
            Self::Corner(label) => Literal::Int(*label),
            Self::Relation { a, b, weights } => {
                let mut items = vec![a.to_literal(), b.to_literal()];
                match *weights {
                    Weights::Midpoint => {}
                    Weights::Split(t) => items.push(Literal::Float(t)),
                    Weights::Independent(t0, t1) => {
                        items.push(Literal::Float(t0));
                        items.push(Literal::Float(t1));
                    }
                }
                Literal::Tuple(items)
            }
        }
    }

    fn from_literal(lit: &Literal) -> TopologyResult<Self> {
        match lit {
            Literal::Int(label) => Ok(Self::Corner(*label)),
            Literal::Tuple(items) | Literal::List(items) => {
                let weight = |i: usize| {
                    items[i].as_number().ok_or_else(|| {
                        TopologyError::invalid(lit, format!("weight {} is not a number", items[i]))
                    })
                };
                let weights = match items.len() {
                    2 => Weights::Midpoint,
                    3 => Weights::Split(weight(2)?),
                    4 => Weights::Independent(weight(2)?, weight(3)?),
                    n => {
                        return Err(TopologyError::invalid(
                            lit,
                            format!("relation has {n} elements, expected 2 to 4"),
                        ))
                    }
                };
                Ok(Self::Relation {
                    a: Box::new(Self::from_literal(&items[0])?),
                    b: Box::new(Self::from_literal(&items[1])?),
                    weights,
                })
            }
            other => Err(TopologyError::invalid(other, "not a node reference")),
        }
    }
}

impl From<i64> for NodeRef {
    fn from(label: i64) -> Self {
        Self::Corner(label)
    }
}

impl From<i32> for NodeRef {
    fn from(label: i32) -> Self {
        Self::Corner(i64::from(label))
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

/// One configuration item in typed form.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    /// Splice the descriptors stored in a file.
    Template {
        /// Path of the template file.
        filepath: String,
    },
    /// Register a named variable.
    Var {
        /// Variable name.
        name: String,
        /// Bound value.
        value: f64,
    },
    /// Fillet the cell edges.
    Fillet {
        /// Attribute map, expected to hold `radius`.
        attributes: Attributes,
    },
    /// Node, strut or face.
    Geometry {
        /// Node references, in order.
        refs: Vec<NodeRef>,
        /// Attribute map.
        attributes: Attributes,
    },
}

impl Descriptor {
    /// Geometry descriptor.
    #[must_use]
    pub fn geometry(refs: Vec<NodeRef>, attributes: Attributes) -> Self {
        Self::Geometry { refs, attributes }
    }

    /// Strut between two references with a literal diameter.
    #[must_use]
    pub fn strut(
        a: impl Into<NodeRef>,
        b: impl Into<NodeRef>,
        diameter: impl Into<AttributeValue>,
    ) -> Self {
        Self::Geometry {
            refs: vec![a.into(), b.into()],
            attributes: vec![(AttributeKey::Diameter, diameter.into())],
        }
    }

    /// Variable declaration.
    #[must_use]
    pub fn var(name: impl Into<String>, value: f64) -> Self {
        Self::Var {
            name: name.into(),
            value,
        }
    }

    /// Fillet request.
    #[must_use]
    pub fn fillet(radius: impl Into<AttributeValue>) -> Self {
        Self::Fillet {
            attributes: vec![(AttributeKey::Radius, radius.into())],
        }
    }

    /// Template inclusion.
    #[must_use]
    pub fn template(filepath: impl Into<String>) -> Self {
        Self::Template {
            filepath: filepath.into(),
        }
    }

    /// Converts to the literal form.
    #[must_use]
    pub fn to_literal(&self) -> Literal {
        let tagged = |tag: &str, entries: Vec<(Literal, Literal)>| {
            Literal::List(vec![Literal::from(tag), Literal::Dict(entries)])
        };
        let attribute_dict = |attributes: &Attributes| {
            attributes
                .iter()
                .map(|(k, v)| (Literal::from(k.name()), v.to_literal()))
                .collect::<Vec<_>>()
        };
        match self {
            Self::Template { filepath } => tagged(
                TEMPLATE,
                vec![(Literal::from("filepath"), Literal::from(filepath.as_str()))],
            ),
            Self::Var { name, value } => tagged(
                VAR,
                vec![
                    (Literal::from("name"), Literal::from(name.as_str())),
                    (Literal::from("value"), Literal::Float(*value)),
                ],
            ),
            Self::Fillet { attributes } => tagged(FILLET, attribute_dict(attributes)),
            Self::Geometry { refs, attributes } => {
                let mut items: Vec<Literal> = refs.iter().map(NodeRef::to_literal).collect();
                items.push(Literal::Dict(attribute_dict(attributes)));
                Literal::List(items)
            }
        }
    }

    /// Interprets a literal as a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidDescriptor`] for malformed literals and
    /// [`TopologyError::UnknownAttribute`] for attribute keys no entity
    /// accepts.
    pub fn from_literal(lit: &Literal) -> TopologyResult<Self> {
        let Literal::List(items) = lit else {
            return Err(TopologyError::invalid(lit, "descriptor must be a list"));
        };
        let Some(first) = items.first() else {
            return Err(TopologyError::invalid(lit, "empty descriptor"));
        };

        if let Some(tag) = first.as_str() {
            let info = match items.last() {
                Some(info @ Literal::Dict(_)) if items.len() >= 2 => info,
                _ => return Err(TopologyError::invalid(lit, format!("'{tag}' needs a dict"))),
            };
            let field = |key: &str| {
                info.dict_get(key)
                    .ok_or_else(|| TopologyError::invalid(lit, format!("'{tag}' needs '{key}'")))
            };
            return match tag {
                TEMPLATE => {
                    let filepath = field("filepath")?
                        .as_str()
                        .ok_or_else(|| TopologyError::invalid(lit, "filepath must be a string"))?;
                    Ok(Self::template(filepath))
                }
                VAR => {
                    let name = field("name")?
                        .as_str()
                        .ok_or_else(|| TopologyError::invalid(lit, "name must be a string"))?;
                    let value = field("value")?
                        .as_number()
                        .ok_or_else(|| TopologyError::invalid(lit, "value must be a number"))?;
                    Ok(Self::var(name, value))
                }
                FILLET => Ok(Self::Fillet {
                    attributes: attributes_from_literal(lit, info)?,
                }),
                other => Err(TopologyError::invalid(lit, format!("unknown tag '{other}'"))),
            };
        }

        let (attributes, refs) = match items.split_last() {
            Some((dict @ Literal::Dict(_), refs)) => (attributes_from_literal(lit, dict)?, refs),
            _ => (Vec::new(), items.as_slice()),
        };
        if refs.is_empty() {
            return Err(TopologyError::invalid(lit, "no node references"));
        }
        let refs = refs
            .iter()
            .map(NodeRef::from_literal)
            .collect::<TopologyResult<Vec<_>>>()?;
        Ok(Self::Geometry { refs, attributes })
    }

    /// Attribute map of fillet and geometry descriptors.
    #[must_use]
    pub fn attributes(&self) -> &[(AttributeKey, AttributeValue)] {
        match self {
            Self::Fillet { attributes } | Self::Geometry { attributes, .. } => attributes,
            Self::Template { .. } | Self::Var { .. } => &[],
        }
    }
}

fn attributes_from_literal(descriptor: &Literal, dict: &Literal) -> TopologyResult<Attributes> {
    let Literal::Dict(entries) = dict else {
        return Err(TopologyError::invalid(descriptor, "attributes must be a dict"));
    };
    entries
        .iter()
        .map(|(k, v)| {
            let name = k.as_str().ok_or_else(|| {
                TopologyError::invalid(descriptor, "attribute keys must be strings")
            })?;
            let key = AttributeKey::from_name(name).ok_or_else(|| TopologyError::UnknownAttribute {
                key: name.to_owned(),
                kind: "any",
            })?;
            let value = match v {
                Literal::Str(var) => AttributeValue::Variable(var.clone()),
                other => AttributeValue::Number(other.as_number().ok_or_else(|| {
                    TopologyError::invalid(
                        descriptor,
                        format!("attribute '{name}' is not a number"),
                    )
                })?),
            };
            Ok((key, value))
        })
        .collect()
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

impl FromStr for Descriptor {
    type Err = TopologyError;

    fn from_str(s: &str) -> TopologyResult<Self> {
        Self::from_literal(&literal::parse(s)?)
    }
}

/// Parses text holding one or several descriptors.
///
/// A single top-level list or tuple whose elements are all lists is treated
/// as a list of descriptors.
///
/// # Errors
///
/// Returns the first parse or descriptor error.
pub fn parse_descriptors(text: &str) -> TopologyResult<Vec<Descriptor>> {
    let mut values = literal::parse_sequence(text)?;
    if let [Literal::List(items) | Literal::Tuple(items)] = values.as_slice() {
        if !items.is_empty() && items.iter().all(|item| matches!(item, Literal::List(_))) {
            values = items.clone();
        }
    }
    values.iter().map(Descriptor::from_literal).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lattice_types::CellSize;

    fn corners() -> CornerSet {
        CornerSet::from_size(CellSize::cubic(2.0))
    }

    #[test]
    fn test_parse_strut() {
        let d: Descriptor = "[1, 7, {'diameter': 0.4}]".parse().unwrap();
        assert_eq!(d, Descriptor::strut(1, 7, 0.4));
    }

    #[test]
    fn test_parse_tagged() {
        let var: Descriptor = "['var', {'name': 'd', 'value': 0.4}]".parse().unwrap();
        assert_eq!(var, Descriptor::var("d", 0.4));
        let fillet: Descriptor = "['fillet', {'radius': 0.2}]".parse().unwrap();
        assert_eq!(fillet, Descriptor::fillet(0.2));
        let template: Descriptor = "['template', {'filepath': 'bcc.txt'}]".parse().unwrap();
        assert_eq!(template, Descriptor::template("bcc.txt"));
    }

    #[test]
    fn test_integer_attribute_is_number() {
        let d: Descriptor = "[1, {'diameter': 1}]".parse().unwrap();
        assert_eq!(d.attributes(), &[(AttributeKey::Diameter, AttributeValue::Number(1.0))]);
    }

    #[test]
    fn test_variable_reference() {
        let d: Descriptor = "[1, 7, {'diameter': 'd'}]".parse().unwrap();
        assert_eq!(d, Descriptor::strut(1, 7, "d"));
        assert_eq!(d.to_string(), "[1, 7, {'diameter': 'd'}]");
    }

    #[test]
    fn test_nested_relation() {
        let d: Descriptor = "[((1, 2), 7, 0.25), {'diameter': 0.1}]".parse().unwrap();
        let Descriptor::Geometry { refs, .. } = &d else {
            panic!("expected geometry");
        };
        let inner = NodeRef::relation(1, 2, Weights::Midpoint);
        assert_eq!(refs[0], NodeRef::relation(inner, 7, Weights::Split(0.25)));
    }

    #[test]
    fn test_invalid_descriptors() {
        assert!(matches!(
            "7".parse::<Descriptor>(),
            Err(TopologyError::InvalidDescriptor { .. })
        ));
        assert!("[]".parse::<Descriptor>().is_err());
        assert!("[{'diameter': 1.0}]".parse::<Descriptor>().is_err());
        assert!("[(1, 2, 3, 4, 5), {}]".parse::<Descriptor>().is_err());
        assert!("[(1, 2, 'a'), {}]".parse::<Descriptor>().is_err());
        assert!("['var', {'name': 'd'}]".parse::<Descriptor>().is_err());
        assert!("['var', {'name': 'd', 'value': 'x'}]".parse::<Descriptor>().is_err());
        assert!("['lofted', {}]".parse::<Descriptor>().is_err());
        assert!(matches!(
            "[1, 7, {'width': 1.0}]".parse::<Descriptor>(),
            Err(TopologyError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_corner_point_matches_corner_set() {
        let set = corners();
        for label in 1..=8 {
            let p = NodeRef::Corner(label).point(&set).unwrap();
            let index = CornerIndex::new(label).unwrap();
            assert_eq!(p, set.get(index));
        }
    }

    #[test]
    fn test_corner_out_of_range() {
        let set = corners();
        for label in [0, 9, -1] {
            assert!(matches!(
                NodeRef::Corner(label).point(&set),
                Err(TopologyError::IndexOutOfRange { what: "corner", .. })
            ));
        }
        let nested = NodeRef::relation(
            1,
            NodeRef::relation(2, 12, Weights::Midpoint),
            Weights::Midpoint,
        );
        assert!(nested.point(&set).is_err());
    }

    #[test]
    fn test_split_weights() {
        let set = corners();
        let p1 = NodeRef::Corner(1).point(&set).unwrap();
        let p7 = NodeRef::Corner(7).point(&set).unwrap();
        let at = |t: f64| NodeRef::relation(1, 7, Weights::Split(t)).point(&set).unwrap();
        assert_relative_eq!(at(1.0), p1);
        assert_relative_eq!(at(0.0), p7);
        assert_relative_eq!(at(0.5), Point3::origin());
        assert_relative_eq!(at(0.25), Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_independent_weights_extrapolate() {
        let set = corners();
        let p = NodeRef::relation(7, 1, Weights::Independent(1.0, 0.5))
            .point(&set)
            .unwrap();
        // 1.0 * (1, 1, 1) + 0.5 * (-1, -1, -1)
        assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.5));
        let beyond = NodeRef::relation(7, 1, Weights::Independent(2.0, 0.0))
            .point(&set)
            .unwrap();
        assert_relative_eq!(beyond, Point3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_parse_descriptors_flattening() {
        let list =
            parse_descriptors("[[1, 7, {'diameter': 0.4}], [2, 8, {'diameter': 0.4}]]").unwrap();
        assert_eq!(list.len(), 2);
        let single = parse_descriptors("[1, 7, {'diameter': 0.4}]").unwrap();
        assert_eq!(single.len(), 1);
        let joined = parse_descriptors(
            "['var', {'name': 'd', 'value': 0.4}],\n[1, 7, {'diameter': 'd'}]",
        )
        .unwrap();
        assert_eq!(joined[0], Descriptor::var("d", 0.4));
    }

    #[test]
    fn test_display_round_trip() {
        let texts = [
            "[1, 7, {'diameter': 0.4}]",
            "[(1, 7), (2, 8, 0.25), (3, 5, 0.5, 0.5), {'thickness': 0.1}]",
            "['var', {'name': 'd', 'value': 0.4}]",
            "['fillet', {'radius': 'r'}]",
            "['template', {'filepath': 'cells/bcc.txt'}]",
        ];
        for text in texts {
            let d: Descriptor = text.parse().unwrap();
            assert_eq!(d.to_string(), text);
        }
    }
}
