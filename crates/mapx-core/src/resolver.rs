//! Layered lookup of resource paths across archive sources.

use std::fmt;
use std::sync::Arc;

use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;
use crate::source::ArchiveSource;

/// Identifier of one configuration snapshot of the source stack.
///
/// Generations increase monotonically; a tree built for an older generation
/// is stale once the source list changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a source in the resolver's registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub usize);

/// Provenance of a resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    /// Registration index of the source.
    pub id: SourceId,
    /// Display name of the source.
    pub name: String,
    /// `true` if the source is the primary archive.
    pub is_primary: bool,
}

/// A logical path together with the source that won the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// The path as requested, with its original spelling.
    pub relative_path: String,
    /// The winning source.
    pub source: SourceHandle,
}

enum Layer {
    Source(Arc<dyn ArchiveSource>),
    PrimarySlot,
}

/// Builder for [`LayeredResolver`].
///
/// Sources registered later take precedence over sources registered
/// earlier. The primary archive takes part in that order at the position
/// marked with [`primary_slot`](Self::primary_slot); without a slot it is
/// consulted last.
///
/// # Examples
///
/// ```
/// use mapx_core::resolver::Generation;
/// use mapx_core::resolver::ResolverBuilder;
/// use mapx_core::source::MemorySource;
/// use std::sync::Arc;
///
/// let base = Arc::new(MemorySource::new("base").with_file("a.bmp", b"base".to_vec()));
/// let patch = Arc::new(MemorySource::new("patch").with_file("a.bmp", b"patch".to_vec()));
///
/// let resolver = ResolverBuilder::new(Generation(1))
///     .source(base)
///     .source(patch)
///     .build();
///
/// assert_eq!(resolver.resolve("A.BMP").unwrap(), b"patch");
/// ```
pub struct ResolverBuilder {
    generation: Generation,
    layers: Vec<Layer>,
    primary: Option<Arc<dyn ArchiveSource>>,
}

impl ResolverBuilder {
    /// Starts an empty builder for a configuration generation.
    #[must_use]
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            layers: Vec::new(),
            primary: None,
        }
    }

    /// Registers a source above everything registered so far.
    #[must_use]
    pub fn source(mut self, source: Arc<dyn ArchiveSource>) -> Self {
        self.layers.push(Layer::Source(source));
        self
    }

    /// Sets the primary archive.
    #[must_use]
    pub fn primary(mut self, source: Arc<dyn ArchiveSource>) -> Self {
        self.primary = Some(source);
        self
    }

    /// Places the primary archive at this point of the registration order.
    ///
    /// Only the first slot is honored.
    #[must_use]
    pub fn primary_slot(mut self) -> Self {
        if !self.layers.iter().any(|l| matches!(l, Layer::PrimarySlot)) {
            self.layers.push(Layer::PrimarySlot);
        }
        self
    }

    /// Builds the resolver.
    #[must_use]
    pub fn build(self) -> LayeredResolver {
        let mut registered: Vec<(SourceHandle, Arc<dyn ArchiveSource>)> = Vec::new();
        let mut primary = self.primary;

        for layer in self.layers {
            let (source, is_primary) = match layer {
                Layer::Source(source) => (source, false),
                Layer::PrimarySlot => match primary.take() {
                    Some(source) => (source, true),
                    None => continue,
                },
            };
            let handle = SourceHandle {
                id: SourceId(registered.len()),
                name: source.name().to_string(),
                is_primary,
            };
            registered.push((handle, source));
        }

        // Highest priority first; an unslotted primary is the final fallback.
        let mut order: Vec<_> = registered.into_iter().rev().collect();
        if let Some(source) = primary {
            let handle = SourceHandle {
                id: SourceId(order.len()),
                name: source.name().to_string(),
                is_primary: true,
            };
            order.push((handle, source));
        }

        tracing::debug!(
            generation = self.generation.0,
            sources = order.len(),
            "built layered resolver"
        );

        LayeredResolver {
            generation: self.generation,
            order,
        }
    }
}

/// Resolves logical paths against a priority-ordered stack of sources.
///
/// The resolver never mutates its sources. It is immutable once built; a
/// changed source list produces a new resolver with a new generation.
pub struct LayeredResolver {
    generation: Generation,
    order: Vec<(SourceHandle, Arc<dyn ArchiveSource>)>,
}

impl fmt::Debug for LayeredResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredResolver")
            .field("generation", &self.generation)
            .field("search_order", &self.search_order())
            .finish()
    }
}

impl LayeredResolver {
    /// Returns the configuration generation this resolver was built for.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the sources in the order they are searched.
    #[must_use]
    pub fn search_order(&self) -> Vec<SourceHandle> {
        self.order.iter().map(|(handle, _)| handle.clone()).collect()
    }

    /// Returns the primary archive's handle, if one was configured.
    #[must_use]
    pub fn primary(&self) -> Option<SourceHandle> {
        self.order
            .iter()
            .find(|(handle, _)| handle.is_primary)
            .map(|(handle, _)| handle.clone())
    }

    /// Returns the number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no sources are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn find(&self, key: &NormalizedPath) -> Option<&(SourceHandle, Arc<dyn ArchiveSource>)> {
        self.order.iter().find(|(_, source)| source.contains(key))
    }

    /// Returns the source that holds `path`.
    #[must_use]
    pub fn locate(&self, path: &str) -> Option<SourceHandle> {
        self.find(&NormalizedPath::new(path))
            .map(|(handle, _)| handle.clone())
    }

    /// Looks up `path` and returns it with its provenance.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<ResolvedPath> {
        self.locate(path).map(|source| ResolvedPath {
            relative_path: path.to_string(),
            source,
        })
    }

    /// Returns the bytes of `path` from the winning source.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NotFound` if no source holds the path, or the
    /// winning source's read error.
    pub fn resolve(&self, path: &str) -> Result<Vec<u8>> {
        let key = NormalizedPath::new(path);
        let (handle, source) = self.find(&key).ok_or_else(|| MapError::NotFound {
            path: path.to_string(),
        })?;
        tracing::trace!(path, source = %handle.name, "resolved");
        source.read(&key)
    }

    /// Reads `path` from one specific source, bypassing precedence.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NotFound` if the source id is unknown or the
    /// source does not hold the path.
    pub fn read(&self, id: SourceId, path: &str) -> Result<Vec<u8>> {
        let (_, source) = self
            .order
            .iter()
            .find(|(handle, _)| handle.id == id)
            .ok_or_else(|| MapError::NotFound {
                path: path.to_string(),
            })?;
        source.read(&NormalizedPath::new(path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn mem(name: &str, files: &[(&str, &[u8])]) -> Arc<dyn ArchiveSource> {
        let mut source = MemorySource::new(name);
        for (path, data) in files {
            source.insert(path, data.to_vec());
        }
        Arc::new(source)
    }

    #[test]
    fn test_later_source_wins() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(mem("base", &[("a.bmp", b"base"), ("b.bmp", b"base-b")]))
            .source(mem("patch", &[("a.bmp", b"patch")]))
            .build();

        assert_eq!(resolver.resolve("a.bmp").unwrap(), b"patch");
        assert_eq!(resolver.resolve("B.BMP").unwrap(), b"base-b");
        assert_eq!(resolver.locate("a.bmp").unwrap().name, "patch");
    }

    #[test]
    fn test_unslotted_primary_is_fallback() {
        let resolver = ResolverBuilder::new(Generation(0))
            .primary(mem("primary", &[("a.bmp", b"primary"), ("only.bmp", b"p")]))
            .source(mem("patch", &[("a.bmp", b"patch")]))
            .build();

        assert_eq!(resolver.resolve("a.bmp").unwrap(), b"patch");
        let handle = resolver.locate("only.bmp").unwrap();
        assert!(handle.is_primary);

        let order: Vec<_> = resolver.search_order().into_iter().map(|h| h.name).collect();
        assert_eq!(order, ["patch", "primary"]);
    }

    #[test]
    fn test_primary_slot_position() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(mem("low", &[("a.bmp", b"low")]))
            .primary(mem("primary", &[("a.bmp", b"primary")]))
            .primary_slot()
            .source(mem("high", &[("b.bmp", b"high")]))
            .build();

        let order: Vec<_> = resolver.search_order().into_iter().map(|h| h.name).collect();
        assert_eq!(order, ["high", "primary", "low"]);
        assert_eq!(resolver.resolve("a.bmp").unwrap(), b"primary");
        assert_eq!(resolver.primary().unwrap().id, SourceId(1));
    }

    #[test]
    fn test_slot_without_primary_is_skipped() {
        let resolver = ResolverBuilder::new(Generation(3))
            .primary_slot()
            .source(mem("only", &[]))
            .build();
        assert_eq!(resolver.len(), 1);
        assert!(resolver.primary().is_none());
        assert_eq!(resolver.generation(), Generation(3));
    }

    #[test]
    fn test_not_found() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(mem("base", &[]))
            .build();
        assert!(matches!(
            resolver.resolve("data\\missing.bmp"),
            Err(MapError::NotFound { .. })
        ));
        assert!(resolver.resolve_path("data\\missing.bmp").is_none());
    }

    #[test]
    fn test_resolve_path_keeps_spelling() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(mem("base", &[("data/texture/wall.bmp", b"w")]))
            .build();
        let resolved = resolver.resolve_path("data\\texture\\Wall.bmp").unwrap();
        assert_eq!(resolved.relative_path, "data\\texture\\Wall.bmp");
        assert_eq!(resolved.source.id, SourceId(0));
    }

    #[test]
    fn test_read_from_specific_source() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(mem("base", &[("a.bmp", b"base")]))
            .source(mem("patch", &[("a.bmp", b"patch")]))
            .build();
        assert_eq!(resolver.read(SourceId(0), "a.bmp").unwrap(), b"base");
        assert!(resolver.read(SourceId(9), "a.bmp").is_err());
    }
}
