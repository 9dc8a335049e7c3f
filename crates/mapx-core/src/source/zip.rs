//! ZIP archive source.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;

use super::ArchiveSource;
use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

/// A ZIP archive whose file entries are addressed by entry name.
///
/// The central directory is indexed when the archive is opened. Reads are
/// serialized on the underlying file handle.
#[derive(Debug)]
pub struct ZipSource {
    name: String,
    archive: Mutex<::zip::ZipArchive<File>>,
    index: HashMap<NormalizedPath, usize>,
}

impl ZipSource {
    /// Opens and indexes a ZIP archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid ZIP
    /// archive.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let file = File::open(path)?;
        let mut archive = ::zip::ZipArchive::new(file).map_err(|e| MapError::InvalidSource {
            name: name.clone(),
            reason: format!("failed to open ZIP archive: {e}"),
        })?;

        let mut index = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(|e| MapError::InvalidSource {
                name: name.clone(),
                reason: format!("failed to read ZIP entry: {e}"),
            })?;
            if entry.is_dir() {
                continue;
            }
            index.entry(NormalizedPath::new(entry.name())).or_insert(i);
        }

        tracing::debug!(archive = %name, files = index.len(), "indexed ZIP source");

        Ok(Self {
            name,
            archive: Mutex::new(archive),
            index,
        })
    }
}

impl ArchiveSource for ZipSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, path: &NormalizedPath) -> bool {
        self.index.contains_key(path)
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        let idx = *self.index.get(path).ok_or_else(|| MapError::NotFound {
            path: path.to_string(),
        })?;

        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entry = archive.by_index(idx).map_err(|e| MapError::InvalidSource {
            name: self.name.clone(),
            reason: format!("failed to read {path}: {e}"),
        })?;

        let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_zip;
    use tempfile::TempDir;

    #[test]
    fn test_zip_source_reads_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("patch.zip");
        std::fs::write(
            &path,
            create_test_zip(vec![
                ("data/texture/Wall.bmp", b"wall"),
                ("data/prontera.gnd", b"gnd"),
            ]),
        )
        .unwrap();

        let source = ZipSource::open(&path).unwrap();
        let key = NormalizedPath::new("data\\texture\\wall.bmp");
        assert!(source.contains(&key));
        assert_eq!(source.read(&key).unwrap(), b"wall");
        assert!(!source.contains(&NormalizedPath::new("data\\other.gnd")));
    }

    #[test]
    fn test_zip_source_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.zip");
        std::fs::write(&path, b"not a zip").unwrap();

        let result = ZipSource::open(&path);
        assert!(matches!(result, Err(MapError::InvalidSource { .. })));
    }
}
