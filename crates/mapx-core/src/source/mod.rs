//! Archive sources: read-only providers of resource bytes.
//!
//! A source answers two questions for a [`NormalizedPath`]: does it contain
//! the path, and what are its bytes. Several sources are layered by the
//! [`LayeredResolver`](crate::LayeredResolver).
//!
//! Provided implementations:
//!
//! - [`DirectorySource`]: loose files below a directory
//! - [`ZipSource`]: a ZIP archive
//! - [`TarSource`]: a TAR or gzip-compressed TAR archive
//! - [`MemorySource`]: in-memory files, for tests and embedding
//! - [`LazySource`]: opens one of the above from a path on first use

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;

pub mod directory;
pub mod lazy;
pub mod memory;
pub mod tar;
pub mod zip;

pub use directory::DirectorySource;
pub use lazy::LazySource;
pub use memory::MemorySource;
pub use self::tar::TarSource;
pub use self::zip::ZipSource;

/// A read-only provider of resource bytes keyed by normalized path.
///
/// Implementations must be safe to query from several threads at once.
pub trait ArchiveSource: Send + Sync + fmt::Debug {
    /// Display name used for provenance checks and diagnostics.
    fn name(&self) -> &str;

    /// Returns `true` if the source holds the path.
    fn contains(&self, path: &NormalizedPath) -> bool;

    /// Reads the bytes stored under the path.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NotFound` if the path is absent, or an I/O or
    /// source error if the stored bytes cannot be read.
    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>>;
}

/// Container formats that can be opened from a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A directory of loose files.
    Directory,
    /// ZIP archive.
    Zip,
    /// Uncompressed TAR archive.
    Tar,
    /// Gzip-compressed TAR archive.
    TarGz,
}

/// Detects the container format of a source path.
///
/// Existing directories are directory sources; otherwise the extension
/// decides.
///
/// # Errors
///
/// Returns `MapError::InvalidSource` if the format cannot be determined.
pub fn detect_format(path: &Path) -> Result<SourceFormat> {
    if path.is_dir() {
        return Ok(SourceFormat::Directory);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        Ok(SourceFormat::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Ok(SourceFormat::TarGz)
    } else if name.ends_with(".tar") {
        Ok(SourceFormat::Tar)
    } else {
        Err(MapError::InvalidSource {
            name: path.display().to_string(),
            reason: "unsupported source format (expected a directory, .zip, .tar or .tar.gz)"
                .to_string(),
        })
    }
}

/// Opens a source from a filesystem path.
///
/// # Errors
///
/// Returns an error if the format is unsupported or the container cannot
/// be read.
pub fn open_source(path: &Path) -> Result<Arc<dyn ArchiveSource>> {
    let source: Arc<dyn ArchiveSource> = match detect_format(path)? {
        SourceFormat::Directory => Arc::new(DirectorySource::open(path)?),
        SourceFormat::Zip => Arc::new(ZipSource::open(path)?),
        SourceFormat::Tar => Arc::new(TarSource::open(path, false)?),
        SourceFormat::TarGz => Arc::new(TarSource::open(path, true)?),
    };
    tracing::debug!(source = source.name(), "opened archive source");
    Ok(source)
}
