//! TAR archive source.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use super::ArchiveSource;
use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

/// A TAR archive, optionally gzip-compressed.
///
/// TAR has no central directory, so regular file entries are loaded into
/// memory when the archive is opened.
#[derive(Debug)]
pub struct TarSource {
    name: String,
    files: HashMap<NormalizedPath, Vec<u8>>,
}

impl TarSource {
    /// Opens a TAR archive and loads its regular files.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or an entry cannot be
    /// read.
    pub fn open(path: &Path, gzip: bool) -> Result<Self> {
        let name = path.display().to_string();
        let reader = BufReader::new(File::open(path)?);
        let files = if gzip {
            load_entries(::tar::Archive::new(GzDecoder::new(reader)), &name)?
        } else {
            load_entries(::tar::Archive::new(reader), &name)?
        };

        tracing::debug!(archive = %name, files = files.len(), "loaded TAR source");
        Ok(Self { name, files })
    }
}

fn load_entries<R: Read>(
    mut archive: ::tar::Archive<R>,
    name: &str,
) -> Result<HashMap<NormalizedPath, Vec<u8>>> {
    let invalid = |reason: String| MapError::InvalidSource {
        name: name.to_string(),
        reason,
    };

    let entries = archive
        .entries()
        .map_err(|e| invalid(format!("failed to read TAR entries: {e}")))?;

    let mut files = HashMap::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| invalid(format!("failed to read TAR entry: {e}")))?;
        if entry.header().entry_type() != ::tar::EntryType::Regular {
            continue;
        }

        let key = {
            let path = entry
                .path()
                .map_err(|e| invalid(format!("invalid entry path: {e}")))?;
            NormalizedPath::new(&path.to_string_lossy())
        };

        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut data)?;
        files.entry(key).or_insert(data);
    }
    Ok(files)
}

impl ArchiveSource for TarSource {
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
