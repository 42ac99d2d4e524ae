//! Cell configurations: ordered entities plus a variable table.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use lattice_types::CornerSet;
use tracing::debug;

use crate::descriptor::{parse_descriptors, Descriptor};
use crate::entity::Entity;
use crate::error::{TopologyError, TopologyResult};

/// Maximum depth of nested template inclusion.
pub const MAX_TEMPLATE_DEPTH: usize = 16;

/// Batch accepted by [`CellConfiguration::insert`].
#[derive(Debug, Clone)]
pub enum Insert {
    /// Already resolved entities, appended as they are.
    Entities(Vec<Entity>),
    /// Descriptors, variables bound first.
    Descriptors(Vec<Descriptor>),
    /// One descriptor.
    Single(Descriptor),
}

impl From<Vec<Entity>> for Insert {
    fn from(entities: Vec<Entity>) -> Self {
        Self::Entities(entities)
    }
}

impl From<Vec<Descriptor>> for Insert {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Self::Descriptors(descriptors)
    }
}

impl From<Descriptor> for Insert {
    fn from(descriptor: Descriptor) -> Self {
        Self::Single(descriptor)
    }
}

/// Composition of a unit cell.
///
/// Entities are resolved as they are appended, against the corner set and
/// the variables registered so far. A configuration without a corner set
/// rejects every mutation with [`TopologyError::NotInitialized`].
///
/// # Example
///
/// ```
/// use lattice_topology::CellConfiguration;
/// use lattice_types::{CellSize, CornerSet};
///
/// let mut config = CellConfiguration::with_corners(CornerSet::from_size(CellSize::cubic(2.0)));
/// config
///     .insert_str("['var', {'name': 'd', 'value': 0.4}], [1, 7, {'diameter': 'd'}]")
///     .unwrap();
///
/// assert_eq!(config.len(), 1);
/// assert_eq!(config.variable("d"), Some(0.4));
/// assert_eq!(
///     config.to_string(),
///     "['var', {'name': 'd', 'value': 0.4}],\n[1, 7, {'diameter': 'd'}]"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellConfiguration {
    corners: Option<CornerSet>,
    variables: BTreeMap<String, f64>,
    entities: Vec<Entity>,
}

impl CellConfiguration {
    /// Creates an uninitialized configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty configuration over `corners`.
    #[must_use]
    pub fn with_corners(corners: CornerSet) -> Self {
        Self {
            corners: Some(corners),
            ..Self::default()
        }
    }

    /// Parses canonical text, as produced by `Display`, into a
    /// configuration over `corners`.
    ///
    /// # Errors
    ///
    /// Returns the first parse or resolution error.
    pub fn parse(text: &str, corners: CornerSet) -> TopologyResult<Self> {
        let mut config = Self::with_corners(corners);
        config.insert_str(text)?;
        Ok(config)
    }

    /// Replaces the corner set and clears all content.
    pub fn initialize(&mut self, corners: CornerSet) {
        self.reset();
        self.corners = Some(corners);
    }

    /// Returns true once a corner set is present.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.corners.is_some()
    }

    /// The corner set entities are resolved against.
    #[must_use]
    pub const fn corners(&self) -> Option<&CornerSet> {
        self.corners.as_ref()
    }

    fn require_corners(&self) -> TopologyResult<&CornerSet> {
        self.corners.as_ref().ok_or(TopologyError::NotInitialized)
    }

    /// Appends one descriptor.
    ///
    /// `var` registers (or rebinds) a variable, `template` splices the
    /// descriptors of a file, everything else is resolved into an entity.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotInitialized`] without a corner set, or any error
    /// from reading a template or resolving the entity. On error the
    /// configuration is left unchanged, including entities and variables
    /// from a partially spliced template.
    pub fn append(&mut self, descriptor: Descriptor) -> TopologyResult<()> {
        self.require_corners()?;
        self.atomically(|config| config.append_nested(descriptor, 0))
    }

    /// Runs `apply`, restoring entities and variables if it fails.
    fn atomically(
        &mut self,
        apply: impl FnOnce(&mut Self) -> TopologyResult<()>,
    ) -> TopologyResult<()> {
        let len = self.entities.len();
        let variables = self.variables.clone();
        let result = apply(self);
        if result.is_err() {
            self.entities.truncate(len);
            self.variables = variables;
        }
        result
    }

    /// Parses and appends a single descriptor.
    ///
    /// # Errors
    ///
    /// See [`CellConfiguration::append`].
    pub fn append_str(&mut self, text: &str) -> TopologyResult<()> {
        self.require_corners()?;
        self.append(text.parse()?)
    }

    fn append_nested(&mut self, descriptor: Descriptor, depth: usize) -> TopologyResult<()> {
        let corners = *self.require_corners()?;
        match descriptor {
            Descriptor::Var { name, value } => {
                debug!("Registered variable {} = {}", name, value);
                self.variables.insert(name, value);
            }
            Descriptor::Template { filepath } => {
                if depth >= MAX_TEMPLATE_DEPTH {
                    return Err(TopologyError::invalid(
                        Descriptor::Template { filepath },
                        format!("templates nested deeper than {MAX_TEMPLATE_DEPTH}"),
                    ));
                }
                let text = std::fs::read_to_string(&filepath).map_err(|source| {
                    TopologyError::Io {
                        path: filepath.clone().into(),
                        source,
                    }
                })?;
                let descriptors = parse_descriptors(&text)?;
                debug!("Loaded {} descriptors from template {}", descriptors.len(), filepath);
                for descriptor in descriptors {
                    self.append_nested(descriptor, depth + 1)?;
                }
            }
            entity => {
                let entity = Entity::resolve(entity, &corners, &self.variables)?;
                debug!("Appended {} entity {}", entity.kind(), entity);
                self.entities.push(entity);
            }
        }
        Ok(())
    }

    /// Appends a batch.
    ///
    /// Descriptor batches are processed in two passes: every `var` first,
    /// then the remaining descriptors in order, so an entity may precede the
    /// declaration of the variable it uses.
    ///
    /// # Errors
    ///
    /// See [`CellConfiguration::append`]. A failing batch is discarded as a
    /// whole.
    pub fn insert(&mut self, batch: impl Into<Insert>) -> TopologyResult<()> {
        self.require_corners()?;
        match batch.into() {
            Insert::Entities(entities) => {
                self.entities.extend(entities);
                Ok(())
            }
            Insert::Single(descriptor) => self.append(descriptor),
            Insert::Descriptors(descriptors) => {
                let (vars, rest): (Vec<_>, Vec<_>) = descriptors
                    .into_iter()
                    .partition(|d| matches!(d, Descriptor::Var { .. }));
                self.atomically(|config| {
                    vars.into_iter()
                        .chain(rest)
                        .try_for_each(|descriptor| config.append_nested(descriptor, 0))
                })
            }
        }
    }

    /// Parses text holding one or several descriptors and inserts them.
    ///
    /// # Errors
    ///
    /// See [`CellConfiguration::append`].
    pub fn insert_str(&mut self, text: &str) -> TopologyResult<()> {
        self.require_corners()?;
        self.insert(parse_descriptors(text)?)
    }

    /// Removes all entities and variables. The corner set is kept.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.variables.clear();
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn check_index(&self, index: usize) -> TopologyResult<()> {
        if index < self.entities.len() {
            Ok(())
        } else {
            Err(TopologyError::IndexOutOfRange {
                what: "entity",
                index: i64::try_from(index).unwrap_or(i64::MAX),
                lower: 0,
                upper: i64::try_from(self.entities.len()).unwrap_or(i64::MAX) - 1,
            })
        }
    }

    /// Entity at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] past the last entity.
    pub fn entity(&self, index: usize) -> TopologyResult<&Entity> {
        self.check_index(index)?;
        Ok(&self.entities[index])
    }

    /// Replaces the entity at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::IndexOutOfRange`] past the last entity.
    pub fn set_entity(&mut self, index: usize, entity: Entity) -> TopologyResult<()> {
        self.check_index(index)?;
        self.entities[index] = entity;
        Ok(())
    }

    /// All entities in append order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Iterates entities in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// Registered variables.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, f64> {
        &self.variables
    }

    /// Value of one variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Writes the canonical text to `path`, for inclusion with a `template`
    /// descriptor.
    ///
    /// Only the last value of each variable is written. Entities keep the
    /// variable name, so reading back a configuration that rebound a
    /// variable resolves every reference with that last value.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Io`] if the file cannot be written.
    pub fn write_template(&self, path: impl AsRef<Path>) -> TopologyResult<()> {
        let path = path.as_ref();
        std::fs::write(path, format!("{self}\n")).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<'a> IntoIterator for &'a CellConfiguration {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl fmt::Display for CellConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars = self
            .variables
            .iter()
            .map(|(name, value)| Descriptor::var(name.as_str(), *value));
        let entities = self.entities.iter().map(|e| e.descriptor().clone());
        for (i, descriptor) in vars.chain(entities).enumerate() {
            if i > 0 {
                f.write_str(",\n")?;
            }
            write!(f, "{descriptor}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AttributeKey;
    use approx::assert_relative_eq;
    use lattice_types::CellSize;
    use std::io::Write;

    fn corners() -> CornerSet {
        CornerSet::from_size(CellSize::cubic(2.0))
    }

    fn config() -> CellConfiguration {
        CellConfiguration::with_corners(corners())
    }

    #[test]
    fn test_uninitialized_rejects_mutation() {
        let mut c = CellConfiguration::new();
        assert!(!c.is_initialized());
        assert!(matches!(
            c.append(Descriptor::strut(1, 7, 0.4)),
            Err(TopologyError::NotInitialized)
        ));
        assert!(matches!(
            c.append(Descriptor::var("d", 0.4)),
            Err(TopologyError::NotInitialized)
        ));
        assert!(matches!(c.insert_str("[1, 7, {}]"), Err(TopologyError::NotInitialized)));
        assert!(matches!(c.append_str("garbage"), Err(TopologyError::NotInitialized)));
        assert!(matches!(c.insert(Vec::<Entity>::new()), Err(TopologyError::NotInitialized)));
    }

    #[test]
    fn test_append_dispatch() {
        let mut c = config();
        c.append_str("['var', {'name': 'd', 'value': 0.4}]").unwrap();
        c.append_str("[1, 7, {'diameter': 'd'}]").unwrap();
        c.append_str("['fillet', {'radius': 0.1}]").unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.variables().len(), 1);
        assert_eq!(c.entity(0).unwrap().dimension(), 1);
        assert_eq!(c.entity(1).unwrap().dimension(), -1);
        assert_eq!(c.entity(0).unwrap().get(AttributeKey::Diameter), Some(0.4));
    }

    #[test]
    fn test_rebinding_a_variable_keeps_resolved_entities() {
        let mut c = config();
        c.append(Descriptor::var("d", 0.4)).unwrap();
        c.append(Descriptor::strut(1, 7, "d")).unwrap();
        c.append(Descriptor::var("d", 0.2)).unwrap();
        c.append(Descriptor::strut(2, 8, "d")).unwrap();
        assert_eq!(c.entity(0).unwrap().get(AttributeKey::Diameter), Some(0.4));
        assert_eq!(c.entity(1).unwrap().get(AttributeKey::Diameter), Some(0.2));
        assert_eq!(c.variable("d"), Some(0.2));
    }

    #[test]
    fn test_rebound_variable_is_written_with_last_value() {
        let mut c = config();
        c.append(Descriptor::var("d", 0.4)).unwrap();
        c.append(Descriptor::strut(1, 7, "d")).unwrap();
        c.append(Descriptor::var("d", 0.2)).unwrap();
        c.append(Descriptor::strut(2, 8, "d")).unwrap();

        let reparsed = CellConfiguration::parse(&c.to_string(), corners()).unwrap();
        assert_eq!(reparsed.len(), 2);
        for entity in &reparsed {
            assert_eq!(entity.get(AttributeKey::Diameter), Some(0.2));
        }
    }

    #[test]
    fn test_insert_binds_variables_first() {
        let mut c = config();
        c.insert(vec![
            Descriptor::strut(1, 7, "d"),
            Descriptor::var("d", 0.25),
        ])
        .unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.entity(0).unwrap().get(AttributeKey::Diameter), Some(0.25));

        // a single append has no second pass
        let mut c = config();
        assert!(matches!(
            c.append(Descriptor::strut(1, 7, "d")),
            Err(TopologyError::UnboundVariable(_))
        ));
    }

    #[test]
    fn test_insert_entities_and_single() {
        let mut source = config();
        source.insert_str("[1, 7, {'diameter': 0.4}], [2, 8, {'diameter': 0.4}]").unwrap();

        let mut c = config();
        c.insert(source.entities().to_vec()).unwrap();
        c.insert(Descriptor::strut(3, 5, 0.1)).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.entity(2).unwrap().to_string(), "[3, 5, {'diameter': 0.1}]");
    }

    #[test]
    fn test_failed_batch_leaves_configuration_unchanged() {
        let mut c = config();
        c.insert_str("['var', {'name': 'd', 'value': 0.4}], [1, 7, {'diameter': 'd'}]")
            .unwrap();
        let before = c.to_string();

        let result = c.insert_str(
            "['var', {'name': 'd', 'value': 0.9}], ['var', {'name': 't', 'value': 0.2}],\n\
             [3, 5, {'diameter': 'd'}], [1, 9, {'diameter': 1.0}]",
        );
        assert!(matches!(result, Err(TopologyError::IndexOutOfRange { .. })));
        assert_eq!(c.len(), 1);
        assert_eq!(c.variable("d"), Some(0.4));
        assert_eq!(c.variable("t"), None);
        assert_eq!(c.to_string(), before);

        let result = c.insert(vec![
            Descriptor::strut(2, 8, 0.3),
            Descriptor::strut(1, 7, "missing"),
        ]);
        assert!(matches!(result, Err(TopologyError::UnboundVariable(_))));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_failed_template_leaves_configuration_unchanged() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "['var', {'name': 'w', 'value': 0.3}], [1, 7, {'diameter': 'w'}], [0, 7, {}]",
        )
        .unwrap();
        let mut c = config();
        assert!(c.append(Descriptor::template(file.path().to_string_lossy())).is_err());
        assert!(c.is_empty());
        assert!(c.variables().is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut c = config();
        c.append(Descriptor::strut(1, 7, 0.4)).unwrap();
        assert!(c.entity(0).is_ok());
        assert!(matches!(
            c.entity(1),
            Err(TopologyError::IndexOutOfRange { what: "entity", index: 1, .. })
        ));
        let replacement = c.entity(0).unwrap().clone();
        assert!(c.set_entity(3, replacement.clone()).is_err());
        c.set_entity(0, replacement).unwrap();
    }

    #[test]
    fn test_reset_clears_entities_and_variables() {
        let mut c = config();
        c.insert_str("['var', {'name': 'd', 'value': 0.4}], [1, 7, {'diameter': 'd'}]")
            .unwrap();
        c.reset();
        assert!(c.is_empty());
        assert!(c.variables().is_empty());
        assert!(c.is_initialized());
        assert_eq!(c.to_string(), "");
    }

    #[test]
    fn test_initialize_replaces_corners() {
        let mut c = CellConfiguration::new();
        c.initialize(corners());
        c.append(Descriptor::strut(1, 7, 0.4)).unwrap();
        c.initialize(CornerSet::from_size(CellSize::cubic(4.0)));
        assert!(c.is_empty());
        c.append(Descriptor::strut(1, 7, 0.4)).unwrap();
        assert_relative_eq!(c.entity(0).unwrap().points()[1].x, 2.0);
    }

    #[test]
    fn test_canonical_text_puts_variables_first() {
        let mut c = config();
        c.append(Descriptor::var("b", 2.0)).unwrap();
        c.append(Descriptor::strut(1, 7, "b")).unwrap();
        c.append(Descriptor::var("a", 1.0)).unwrap();
        c.append(Descriptor::fillet("a")).unwrap();
        assert_eq!(
            c.to_string(),
            "['var', {'name': 'a', 'value': 1.0}],\n\
             ['var', {'name': 'b', 'value': 2.0}],\n\
             [1, 7, {'diameter': 'b'}],\n\
             ['fillet', {'radius': 'a'}]"
        );
    }

    #[test]
    fn test_text_round_trip() {
        let mut c = config();
        c.insert_str(
            "['var', {'name': 'd', 'value': 0.3}],\n\
             [1, 7, {'diameter': 'd'}],\n\
             [(1, 2), (3, 4, 0.25), (5, 6, 0.5, 0.5), {'thickness': 0.05}],\n\
             [((1, 7), 3), {'diameter': 0.2}],\n\
             ['fillet', {'radius': 0.1}]",
        )
        .unwrap();

        let text = c.to_string();
        let back = CellConfiguration::parse(&text, corners()).unwrap();
        assert_eq!(back.variables(), c.variables());
        assert_eq!(back.len(), c.len());
        for (a, b) in c.iter().zip(&back) {
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.points().len(), b.points().len());
            for (pa, pb) in a.points().iter().zip(b.points()) {
                assert_relative_eq!(pa, pb, epsilon = 1e-12);
            }
        }
        assert_eq!(back.to_string(), text);
    }

    #[test]
    fn test_template_inclusion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bcc.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[\n    [1, 7, {{'diameter': 'd'}}],\n    [2, 8, {{'diameter': 'd'}}],\n    [3, 5, {{'diameter': 'd'}}],\n    [4, 6, {{'diameter': 'd'}}],\n]"
        )
        .unwrap();

        let mut c = config();
        c.append(Descriptor::var("d", 0.3)).unwrap();
        c.append(Descriptor::template(path.to_string_lossy())).unwrap();
        assert_eq!(c.len(), 4);
        assert!(c.iter().all(|e| e.get(AttributeKey::Diameter) == Some(0.3)));
    }

    #[test]
    fn test_single_descriptor_template() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[(1, 2), {'diameter': 0.2}]").unwrap();
        let mut c = config();
        c.append(Descriptor::template(file.path().to_string_lossy())).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.entity(0).unwrap().kind(), crate::EntityKind::Node);
    }

    #[test]
    fn test_write_template_then_include() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell.txt");

        let mut c = config();
        c.insert_str("['var', {'name': 'd', 'value': 0.5}], [1, 7, {'diameter': 'd'}]")
            .unwrap();
        c.write_template(&path).unwrap();

        let mut other = config();
        other
            .append(Descriptor::template(path.to_string_lossy()))
            .unwrap();
        assert_eq!(other.variable("d"), Some(0.5));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_recursive_template_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("self.txt");
        let text = format!("['template', {{'filepath': {:?}}}]", path.to_string_lossy());
        std::fs::write(&path, text).unwrap();

        let mut c = config();
        assert!(matches!(
            c.append(Descriptor::template(path.to_string_lossy())),
            Err(TopologyError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_missing_template() {
        let mut c = config();
        assert!(matches!(
            c.append(Descriptor::template("/nonexistent/cell.txt")),
            Err(TopologyError::Io { .. })
        ));
    }
}
