//! Error types for descriptor parsing and configuration assembly.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while parsing descriptors or assembling a cell
/// configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TopologyError {
    /// The configuration has no corner set yet.
    #[error("cell configuration is not initialized: no corner vertices set")]
    NotInitialized,

    /// An entity attribute was looked up but never declared.
    #[error("entity has no attribute '{0}'")]
    AttributeMissing(&'static str),

    /// An attribute key is not accepted by this kind of entity.
    #[error("attribute '{key}' is not accepted by a {kind} entity")]
    UnknownAttribute {
        /// The rejected key.
        key: String,
        /// Entity kind, e.g. `"strut"`.
        kind: &'static str,
    },

    /// A corner or entity index lies outside its valid range.
    #[error("{what} index {index} outside {lower}..={upper}")]
    IndexOutOfRange {
        /// What was indexed, e.g. `"corner"`.
        what: &'static str,
        /// The offending index.
        index: i64,
        /// Smallest valid index.
        lower: i64,
        /// Largest valid index.
        upper: i64,
    },

    /// An attribute refers to a variable that has not been registered.
    #[error("variable '{0}' is not defined")]
    UnboundVariable(String),

    /// A literal has the wrong shape for a descriptor.
    #[error("invalid descriptor {descriptor}: {reason}")]
    InvalidDescriptor {
        /// The literal text of the rejected descriptor.
        descriptor: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Descriptor text is not a valid literal.
    #[error("parse error at byte {offset}: {message}")]
    Parse {
        /// Byte offset into the input text.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// A template file could not be read or written.
    #[error("template {}: {source}", path.display())]
    Io {
        /// Template path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl TopologyError {
    pub(crate) fn invalid(descriptor: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }
}
