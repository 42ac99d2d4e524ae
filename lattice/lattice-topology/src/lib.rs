//! Unit cell topology: descriptors, entities and cell configurations.
//!
//! A unit cell is described by a list of compact descriptors. Each geometry
//! descriptor names cell corners (1 to 8) or weighted relations between them,
//! and carries the attributes of the feature to build:
//!
//! ```text
//! ['var', {'name': 'd', 'value': 0.4}],
//! [1, 7, {'diameter': 'd'}],                 # strut along the space diagonal
//! [(1, 7), {'diameter': 0.6}],               # node at the cell center
//! [1, 2, 3, 4, {'thickness': 0.1}],          # bottom face
//! ['fillet', {'radius': 0.1}]
//! ```
//!
//! A [`CellConfiguration`] resolves each descriptor into an [`Entity`]
//! against a [`CornerSet`](lattice_types::CornerSet) as it is appended. The
//! entity's point count determines the feature built from it: one point is a
//! node, two a strut, three or more a face, none a fillet.
//!
//! # Example
//!
//! ```
//! use lattice_topology::{AttributeKey, CellConfiguration};
//! use lattice_types::{CellSize, CornerSet};
//!
//! let corners = CornerSet::from_size(CellSize::cubic(2.0));
//! let config = CellConfiguration::parse(
//!     "[1, 7, {'diameter': 0.4}],\n[(1, 3), (5, 7), {'diameter': 0.2}]",
//!     corners,
//! )
//! .unwrap();
//!
//! let vertical = config.entity(1).unwrap();
//! assert_eq!(vertical.dimension(), 1);
//! assert_eq!(vertical.points()[0].z, -1.0);
//! assert_eq!(vertical.get(AttributeKey::Diameter), Some(0.2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod descriptor;
mod entity;
mod error;
pub mod literal;

pub use config::{CellConfiguration, Insert, MAX_TEMPLATE_DEPTH};
pub use descriptor::{
    parse_descriptors, AttributeKey, AttributeValue, Attributes, Descriptor, NodeRef, Weights,
};
pub use entity::{Entity, EntityKind, Points};
pub use error::{TopologyError, TopologyResult};
