//! Loose files below a directory.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use super::ArchiveSource;
use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

/// A directory whose files are addressed by their path relative to it.
///
/// The directory is indexed once when opened, so lookups are
/// case-insensitive even on case-sensitive filesystems. Files created
/// afterwards become visible when the source is reopened.
#[derive(Debug)]
pub struct DirectorySource {
    name: String,
    root: PathBuf,
    index: HashMap<NormalizedPath, PathBuf>,
}

impl DirectorySource {
    /// Indexes all regular files below `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a readable directory.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(MapError::InvalidSource {
                name: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let mut index = HashMap::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| MapError::InvalidSource {
                name: root.display().to_string(),
                reason: format!("walkdir error: {e}"),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let key = NormalizedPath::new(&relative.to_string_lossy());
            index.entry(key).or_insert_with(|| relative.to_path_buf());
        }

        tracing::debug!(root = %root.display(), files = index.len(), "indexed directory source");

        Ok(Self {
            name: root.display().to_string(),
            root: root.to_path_buf(),
            index,
        })
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the directory holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ArchiveSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, path: &NormalizedPath) -> bool {
        self.index.contains_key(path)
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        let relative = self.index.get(path).ok_or_else(|| MapError::NotFound {
            path: path.to_string(),
        })?;
        Ok(std::fs::read(self.root.join(relative))?)
    }
}
