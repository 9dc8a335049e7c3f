//! Sources opened on first use.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;

use super::ArchiveSource;
use super::open_source;
use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

/// A configured source path that is opened the first time it is queried.
///
/// The opened handle is cached and shared by every later walk for the same
/// resolver. A path that cannot be opened is logged once and then behaves
/// like an empty source, so one broken entry in the source list never hides
/// the others.
#[derive(Debug)]
pub struct LazySource {
    path: PathBuf,
    name: String,
    cell: OnceLock<std::result::Result<Arc<dyn ArchiveSource>, String>>,
}

impl LazySource {
    /// Creates a lazily opened source for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
            cell: OnceLock::new(),
        }
    }

    /// Returns the configured path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` once an open has been attempted.
    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.cell.get().is_some()
    }

    fn handle(&self) -> std::result::Result<&Arc<dyn ArchiveSource>, &str> {
        self.cell
            .get_or_init(|| {
                open_source(&self.path).map_err(|e| {
                    tracing::warn!(source = %self.name, error = %e, "failed to open archive source");
                    e.to_string()
                })
            })
            .as_ref()
            .map_err(String::as_str)
    }
}

impl ArchiveSource for LazySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, path: &NormalizedPath) -> bool {
        self.handle().is_ok_and(|source| source.contains(path))
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        match self.handle() {
            Ok(source) => source.read(path),
            Err(reason) => Err(MapError::InvalidSource {
                name: self.name.clone(),
                reason: reason.to_string(),
            }),
        }
    }
}
