//! In-memory source.

use std::collections::HashMap;

use super::ArchiveSource;
use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

/// A source backed by an in-memory map of files.
///
/// # Examples
///
/// ```
/// use mapx_core::path::NormalizedPath;
/// use mapx_core::source::ArchiveSource;
/// use mapx_core::source::MemorySource;
///
/// let source = MemorySource::new("patch")
///     .with_file("data\\texture\\wall.bmp", b"BM".to_vec());
/// assert!(source.contains(&NormalizedPath::new("data/texture/WALL.bmp")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    files: HashMap<NormalizedPath, Vec<u8>>,
}

impl MemorySource {
    /// Creates an empty source with a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: HashMap::new(),
        }
    }

    /// Adds a file, replacing any previous file at the same path.
    #[must_use]
    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Adds a file, replacing any previous file at the same path.
    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(NormalizedPath::new(path), data.into());
    }

    /// Returns the number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the source holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArchiveSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, path: &NormalizedPath) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| MapError::NotFound {
                path: path.to_string(),
            })
    }
}
