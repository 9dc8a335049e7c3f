//! Export destinations.
//!
//! The exporter hands every file to an [`ExportSink`]. [`DirectorySink`]
//! writes below a directory on disk; [`StreamSink`] gives each file to a
//! writer supplied by the caller, as drag-and-drop export needs.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::path::SafeRelativePath;

/// Destination of an export.
pub trait ExportSink {
    /// Prepares the directories the export needs, given relative to the
    /// destination root in first-use order. The empty path is the root.
    ///
    /// Returns the number of directories created.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created. The export is
    /// aborted in that case.
    fn prepare_directories(&mut self, dirs: &[PathBuf]) -> io::Result<usize>;

    /// Writes one file and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written. The export records
    /// the failure and continues with the next file.
    fn write_file(&mut self, path: &SafeRelativePath, data: &[u8]) -> io::Result<u64>;

    /// Returns the destination root on disk, if there is one.
    fn location(&self) -> Option<&Path>;
}

/// Writes files below a destination directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Creates a sink rooted at `root`. The directory is created on demand.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the destination root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ExportSink for DirectorySink {
    fn prepare_directories(&mut self, dirs: &[PathBuf]) -> io::Result<usize> {
        let mut created = 0;
        for dir in std::iter::once(Path::new("")).chain(dirs.iter().map(PathBuf::as_path)) {
            let target = self.root.join(dir);
            if !target.is_dir() {
                fs::create_dir_all(&target)?;
                created += 1;
            }
        }
        Ok(created)
    }

    fn write_file(&mut self, path: &SafeRelativePath, data: &[u8]) -> io::Result<u64> {
        let target = self.root.join(path.to_path_buf());
        fs::write(&target, data)?;
        Ok(data.len() as u64)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// Opens the writer for one exported file.
pub type OpenWriter = dyn FnMut(&SafeRelativePath) -> io::Result<Box<dyn Write>> + Send;

/// Delivers each file to a writer obtained from a caller-supplied function.
///
/// # Examples
///
/// ```
/// use mapx_core::export::StreamSink;
/// use std::io;
///
/// let sink = StreamSink::new(|_path| Ok(Box::new(io::sink())));
/// ```
pub struct StreamSink {
    open: Box<OpenWriter>,
}

impl StreamSink {
    /// Creates a sink from a writer factory.
    pub fn new<F>(open: F) -> Self
    where
        F: FnMut(&SafeRelativePath) -> io::Result<Box<dyn Write>> + Send + 'static,
    {
        Self {
            open: Box::new(open),
        }
    }
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink").finish_non_exhaustive()
    }
}

impl ExportSink for StreamSink {
    fn prepare_directories(&mut self, _dirs: &[PathBuf]) -> io::Result<usize> {
        Ok(0)
    }

    fn write_file(&mut self, path: &SafeRelativePath, data: &[u8]) -> io::Result<u64> {
        let mut writer = (self.open)(path)?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(data.len() as u64)
    }

    fn location(&self) -> Option<&Path> {
        None
    }
}
