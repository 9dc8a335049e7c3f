//! Error types for dependency resolution and export operations.

use thiserror::Error;

use crate::resolver::Generation;
use crate::tree::NodeId;

/// Result type alias using `MapError`.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised by the reference extractors for malformed resource bytes.
///
/// A parse error never aborts a walk: the walker records it on the node and
/// continues with the node's siblings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended before a complete structure could be read.
    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    Truncated {
        /// Offset at which the read was attempted.
        offset: usize,
        /// Number of bytes that were missing.
        needed: usize,
    },

    /// The file signature does not match the expected format.
    #[error("bad signature: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// Signature the format requires.
        expected: &'static str,
        /// Signature found in the data (lossy).
        found: String,
    },

    /// The format version is outside the supported range.
    #[error("unsupported {format} version {major}.{minor}")]
    UnsupportedVersion {
        /// Format name.
        format: &'static str,
        /// Major version.
        major: u8,
        /// Minor version.
        minor: u8,
    },

    /// A structural field holds a value that cannot be valid.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Errors that can occur while resolving, walking or exporting resources.
#[derive(Error, Debug)]
pub enum MapError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The path is absent from every archive source.
    #[error("resource not found: {path}")]
    NotFound {
        /// The logical path that was looked up.
        path: String,
    },

    /// Resource bytes could not be parsed.
    #[error("malformed resource: {0}")]
    Parse(#[from] ParseError),

    /// A walk or export was requested while another one is running.
    #[error("another operation is already running for this document")]
    ConcurrentOperation,

    /// Export or selection was requested before any tree was built.
    #[error("no dependency tree has been built yet")]
    NoTree,

    /// An archive source could not be opened or read.
    #[error("invalid archive source {name}: {reason}")]
    InvalidSource {
        /// Display name of the source.
        name: String,
        /// Why the source is unusable.
        reason: String,
    },

    /// A resource path cannot be used as an export destination.
    #[error("invalid resource path {path}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The resource does not come from the primary archive.
    #[error("this file isn't present in the currently opened archive: {path}")]
    NotInPrimary {
        /// The logical path of the resource.
        path: String,
    },

    /// A node id does not belong to the current tree.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The stored tree was built against a source list that has since
    /// changed.
    #[error(
        "dependency tree is out of date (built for generation {}, current is {})",
        .built_for.0,
        .current.0
    )]
    StaleTree {
        /// Generation the tree was built for.
        built_for: Generation,
        /// Generation of the current source list.
        current: Generation,
    },
}

impl MapError {
    /// Returns `true` if this error is contained at the node level.
    ///
    /// Node-level errors mark a single resource as missing or childless and
    /// never unwind the walk or export that encountered them.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapx_core::MapError;
    ///
    /// let err = MapError::NotFound {
    ///     path: "data\\texture\\wall.bmp".into(),
    /// };
    /// assert!(err.is_node_level());
    /// assert!(!MapError::ConcurrentOperation.is_node_level());
    /// ```
    #[must_use]
    pub const fn is_node_level(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Parse(_) | Self::InvalidPath { .. }
        )
    }

    /// Returns `true` if retrying the operation later may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapx_core::MapError;
    ///
    /// assert!(MapError::ConcurrentOperation.is_recoverable());
    /// assert!(!MapError::NoTree.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ConcurrentOperation | Self::Io(_))
    }

    /// Returns the logical resource path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path } | Self::InvalidPath { path, .. } | Self::NotInPrimary { path } => {
                Some(path)
            }
            _ => None,
        }
    }
}
