//! Reference extractors for the supported resource formats.
//!
//! Each extractor maps the raw bytes of one resource to the names it
//! references. Names are returned in the order they appear in the file;
//! the walker joins them with a directory chosen by [`ResourceKind`].
//!
//! | Kind   | Extensions      | References     | Resolved against          |
//! |--------|-----------------|----------------|---------------------------|
//! | Model  | `.rsm`, `.rsm2` | textures       | texture directory         |
//! | Ground | `.gnd`          | textures       | texture directory         |
//! | World  | `.rsw`          | models         | model directory           |
//! | Effect | `.str`          | layer textures | the effect's own directory |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::WalkConfig;
use crate::error::ParseError;
use crate::path;

pub mod gnd;
pub mod reader;
pub mod rsm;
pub mod rsw;
pub mod str;

pub use gnd::GndExtractor;
pub use reader::ByteReader;
pub use rsm::RsmExtractor;
pub use rsw::RswExtractor;
pub use self::str::StrExtractor;

/// Kind of a resource, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Model (`.rsm`, `.rsm2`).
    Model,
    /// Ground (`.gnd`).
    Ground,
    /// World (`.rsw`).
    World,
    /// Effect (`.str`).
    Effect,
    /// Anything else; never has references.
    Other,
}

impl ResourceKind {
    /// Detects the kind of a path from its extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapx_core::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::from_path("data\\model\\Tree.RSM"), ResourceKind::Model);
    /// assert_eq!(ResourceKind::from_path("data\\prontera.gnd"), ResourceKind::Ground);
    /// assert_eq!(ResourceKind::from_path("data\\texture\\wall.bmp"), ResourceKind::Other);
    /// ```
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        match path::extension(path).as_deref() {
            Some("rsm" | "rsm2") => Self::Model,
            Some("gnd") => Self::Ground,
            Some("rsw") => Self::World,
            Some("str") => Self::Effect,
            _ => Self::Other,
        }
    }

    /// Returns the directory references of this kind are resolved against.
    ///
    /// `resource_path` is the joined path of the resource that holds the
    /// references.
    #[must_use]
    pub fn reference_dir<'a>(self, resource_path: &'a str, config: &'a WalkConfig) -> &'a str {
        match self {
            Self::Model | Self::Ground => &config.texture_dir,
            Self::World => &config.model_dir,
            Self::Effect | Self::Other => path::parent_dir(resource_path),
        }
    }

    /// Returns `true` if resources of this kind can reference others.
    #[must_use]
    pub const fn has_references(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Model => "model",
            Self::Ground => "ground",
            Self::World => "world",
            Self::Effect => "effect",
            Self::Other => "file",
        };
        f.write_str(name)
    }
}

/// Extracts the names a resource references.
///
/// Implementations are pure: the same bytes always produce the same list.
/// A resource without references yields an empty list, never an error.
pub trait ReferenceExtractor: Send + Sync {
    /// The kind of resource this extractor reads.
    fn kind(&self) -> ResourceKind;

    /// Returns the referenced names in file order. Duplicates are allowed.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the bytes are malformed.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ParseError>;
}

/// Registry of extractors keyed by resource kind.
///
/// [`ExtractorSet::default`] registers the four built-in extractors;
/// callers may replace any of them.
#[derive(Clone)]
pub struct ExtractorSet {
    extractors: HashMap<ResourceKind, Arc<dyn ReferenceExtractor>>,
}

impl ExtractorSet {
    /// Creates a registry with no extractors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registers an extractor for its kind, replacing any previous one.
    #[must_use]
    pub fn with(mut self, extractor: Arc<dyn ReferenceExtractor>) -> Self {
        self.extractors.insert(extractor.kind(), extractor);
        self
    }

    /// Returns the extractor for a kind.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&dyn ReferenceExtractor> {
        self.extractors.get(&kind).map(AsRef::as_ref)
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::empty()
            .with(Arc::new(RsmExtractor))
            .with(Arc::new(GndExtractor))
            .with(Arc::new(RswExtractor))
            .with(Arc::new(StrExtractor))
    }
}

impl fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.extractors.keys().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("ExtractorSet").field("kinds", &kinds).finish()
    }
}

/// Removes case-insensitive duplicates, keeping the first occurrence.
pub(crate) fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(path::NormalizedPath::new(name)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(ResourceKind::from_path("a.rsm2"), ResourceKind::Model);
        assert_eq!(ResourceKind::from_path("a.RSW"), ResourceKind::World);
        assert_eq!(ResourceKind::from_path("effect\\fire.str"), ResourceKind::Effect);
        assert_eq!(ResourceKind::from_path("noext"), ResourceKind::Other);
        assert!(!ResourceKind::Other.has_references());
    }

    #[test]
    fn test_reference_dirs() {
        let config = WalkConfig::default();
        assert_eq!(
            ResourceKind::Model.reference_dir("data\\model\\a.rsm", &config),
            "data\\texture\\"
        );
        assert_eq!(
            ResourceKind::World.reference_dir("data\\a.rsw", &config),
            "data\\model\\"
        );
        assert_eq!(
            ResourceKind::Effect.reference_dir("data\\texture\\effect\\fire.str", &config),
            "data\\texture\\effect\\"
        );
    }

    #[test]
    fn test_default_set_covers_all_kinds() {
        let set = ExtractorSet::default();
        for kind in [
            ResourceKind::Model,
            ResourceKind::Ground,
            ResourceKind::World,
            ResourceKind::Effect,
        ] {
            assert_eq!(set.get(kind).unwrap().kind(), kind);
        }
        assert!(set.get(ResourceKind::Other).is_none());
    }

    #[test]
    fn test_dedup_names_case_insensitive() {
        let names = vec!["Wall.bmp".into(), "floor.bmp".into(), "WALL.BMP".into()];
        assert_eq!(dedup_names(names), ["Wall.bmp", "floor.bmp"]);
    }
}
