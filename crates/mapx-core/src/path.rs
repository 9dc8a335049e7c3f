//! Logical resource paths.
//!
//! Game resources are addressed by archive-relative paths such as
//! `data\texture\wall.bmp`. Lookups are insensitive to separator style and
//! case, so every source is keyed by a [`NormalizedPath`]. Display strings
//! keep the spelling the resource was referenced with.

use std::fmt;
use std::path::PathBuf;

use crate::MapError;
use crate::Result;

/// Separator used when joining a directory hint with a resource name.
pub const SEPARATOR: char = '\\';

/// A case-folded, `/`-separated resource path used as a lookup key.
///
/// # Examples
///
/// ```
/// use mapx_core::path::NormalizedPath;
///
/// let a = NormalizedPath::new("data\\Texture\\WALL.bmp");
/// let b = NormalizedPath::new("/data/texture/wall.BMP");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "data/texture/wall.bmp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalizes separators and case of a logical path.
    ///
    /// Empty and `.` components are dropped; `..` is kept verbatim so that
    /// it can be rejected later when the path is used for export.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let joined = path
            .split(['\\', '/'])
            .filter(|part| !part.is_empty() && *part != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(joined.to_lowercase())
    }

    /// Returns the normalized string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the path has no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NormalizedPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Joins a directory hint with a resource name.
///
/// The hint may or may not end with a separator; an empty hint yields the
/// name unchanged.
///
/// # Examples
///
/// ```
/// use mapx_core::path::join;
///
/// assert_eq!(join("data\\texture\\", "wall.bmp"), "data\\texture\\wall.bmp");
/// assert_eq!(join("data\\texture", "wall.bmp"), "data\\texture\\wall.bmp");
/// assert_eq!(join("", "prontera.gnd"), "prontera.gnd");
/// ```
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    let name = name.trim_start_matches(['\\', '/']);
    if dir.is_empty() {
        return name.to_string();
    }
    if dir.ends_with(['\\', '/']) {
        format!("{dir}{name}")
    } else {
        format!("{dir}{SEPARATOR}{name}")
    }
}

/// Returns the directory part of a path, including the trailing separator.
///
/// # Examples
///
/// ```
/// use mapx_core::path::parent_dir;
///
/// assert_eq!(parent_dir("data\\texture\\effect\\fire.str"), "data\\texture\\effect\\");
/// assert_eq!(parent_dir("fire.str"), "");
/// ```
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rfind(['\\', '/']).map_or("", |idx| &path[..=idx])
}

/// Returns the final component of a path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rfind(['\\', '/']).map_or(path, |idx| &path[idx + 1..])
}

/// Returns the file name without its extension.
#[must_use]
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Returns the lowercase extension of a path without the dot.
#[must_use]
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_lowercase()),
        _ => None,
    }
}

/// A resource path validated for use below an export destination.
///
/// Construction rejects absolute paths, drive prefixes, parent traversal and
/// NUL bytes, so joining a `SafeRelativePath` onto a destination can never
/// escape it.
///
/// # Examples
///
/// ```
/// use mapx_core::path::SafeRelativePath;
///
/// let safe = SafeRelativePath::validate("data\\texture\\wall.bmp").unwrap();
/// assert_eq!(safe.components(), ["data", "texture", "wall.bmp"]);
///
/// assert!(SafeRelativePath::validate("..\\..\\etc\\passwd").is_err());
/// assert!(SafeRelativePath::validate("C:\\windows\\evil.dll").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeRelativePath {
    original: String,
    components: Vec<String>,
}

impl SafeRelativePath {
    /// Validates a logical resource path.
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidPath` when the path is empty, absolute,
    /// contains `..`, a drive prefix or NUL bytes.
    pub fn validate(path: &str) -> Result<Self> {
        let reject = |reason: &str| MapError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.contains('\0') {
            return Err(reject("path contains null bytes"));
        }
        if path.starts_with(['\\', '/']) {
            return Err(reject("absolute paths are not allowed"));
        }

        let mut components = Vec::new();
        for part in path.split(['\\', '/']) {
            match part {
                "" | "." => {}
                ".." => return Err(reject("parent directory traversal")),
                _ if part.contains(':') => return Err(reject("drive or stream prefix")),
                _ => components.push(part.to_string()),
            }
        }

        if components.is_empty() {
            return Err(reject("empty path"));
        }

        Ok(Self {
            original: path.to_string(),
            components,
        })
    }

    /// Returns the path as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Returns the validated components.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Returns the path with platform separators.
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        self.components.iter().collect()
    }

    /// Returns the parent directory with platform separators, if any.
    #[must_use]
    pub fn parent(&self) -> Option<PathBuf> {
        match self.components.split_last() {
            Some((_, dirs)) if !dirs.is_empty() => Some(dirs.iter().collect()),
            _ => None,
        }
    }

    /// Returns the normalized lookup key of this path.
    #[must_use]
    pub fn normalized(&self) -> NormalizedPath {
        NormalizedPath::new(&self.original)
    }
}

impl fmt::Display for SafeRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
