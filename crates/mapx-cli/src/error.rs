//! Error conversion utilities for CLI.
//!
//! Converts mapx-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use mapx_core::MapError;
use std::path::Path;

/// Converts `MapError` to a user-friendly anyhow error with context.
pub fn convert_map_error(err: MapError, archive: &Path) -> anyhow::Error {
    match err {
        MapError::InvalidSource { name, reason } => {
            anyhow!(
                "Cannot open source '{name}': {reason}\n\
                 HINT: Supported sources: directories, .zip, .tar, .tar.gz"
            )
        }
        MapError::NotFound { path } => {
            anyhow!(
                "Resource '{path}' was not found in '{}' or any additional source\n\
                 HINT: Resource paths are relative to the archive root, e.g. data\\prontera.rsw",
                archive.display()
            )
        }
        MapError::InvalidPath { path, reason } => {
            anyhow!(
                "Resource path '{path}' cannot be exported: {reason}\n\
                 HINT: The archive may be malformed. Exclude the file with --exclude."
            )
        }
        MapError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {io_err}",
                archive.display()
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds archive context to a core result.
pub fn add_archive_context<T>(
    result: Result<T, MapError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_map_error(e, archive))
}
