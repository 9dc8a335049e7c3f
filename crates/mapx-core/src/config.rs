//! Walk, export and source-list configuration.

use crate::path;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// Configuration for dependency walks.
///
/// # Examples
///
/// ```
/// use mapx_core::WalkConfig;
///
/// let config = WalkConfig::default();
/// assert_eq!(config.texture_dir, "data\\texture\\");
///
/// let shallow = WalkConfig::default().with_max_depth(4);
/// assert_eq!(shallow.max_depth, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    /// Directory model and ground textures are resolved against.
    pub texture_dir: String,

    /// Directory world model references are resolved against.
    pub model_dir: String,

    /// Directory map roots (`.gnd`, `.rsw`) are resolved against.
    pub map_dir: String,

    /// Maximum nesting depth below a root before recursion stops.
    pub max_depth: usize,
}

impl Default for WalkConfig {
    /// Default values:
    /// - `texture_dir`: `data\texture\`
    /// - `model_dir`: `data\model\`
    /// - `map_dir`: `data\`
    /// - `max_depth`: 32
    fn default() -> Self {
        Self {
            texture_dir: "data\\texture\\".to_string(),
            model_dir: "data\\model\\".to_string(),
            map_dir: "data\\".to_string(),
            max_depth: 32,
        }
    }
}

impl WalkConfig {
    /// Sets the recursion depth cap.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the texture directory.
    #[must_use]
    pub fn with_texture_dir(mut self, dir: impl Into<String>) -> Self {
        self.texture_dir = dir.into();
        self
    }

    /// Sets the model directory.
    #[must_use]
    pub fn with_model_dir(mut self, dir: impl Into<String>) -> Self {
        self.model_dir = dir.into();
        self
    }
}

/// Configuration for exports started from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    /// Fixed extraction directory overriding the per-archive default.
    pub override_dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Returns the directory exports go to when the caller names none.
    ///
    /// Without an override this is the directory containing the primary
    /// archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapx_core::ExportConfig;
    /// use std::path::Path;
    ///
    /// let config = ExportConfig::default();
    /// assert_eq!(
    ///     config.default_dir(Path::new("/games/ro/data.zip")),
    ///     Path::new("/games/ro")
    /// );
    /// ```
    #[must_use]
    pub fn default_dir(&self, primary_archive: &Path) -> PathBuf {
        if let Some(dir) = &self.override_dir {
            return dir.clone();
        }
        primary_archive
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// Prefix identifying the primary-archive marker in a persisted list.
pub const PRIMARY_MARKER: &str = "<primary>:";

/// Delimiter of the persisted source list.
pub const LIST_DELIMITER: char = ',';

/// One entry of a [`SourceList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntry {
    /// An archive or directory path.
    Path(String),
    /// The slot of the currently opened primary archive.
    Primary(String),
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Primary(name) => write!(f, "{PRIMARY_MARKER}{name}"),
        }
    }
}

/// Returns `true` if a marker saved as `marker` stands for `primary`.
fn names_primary(marker: &str, primary: &str) -> bool {
    if marker == primary {
        return true;
    }
    let name = path::file_name(marker);
    !name.is_empty() && name.eq_ignore_ascii_case(path::file_name(primary))
}

/// Ordered list of archive sources, highest priority first.
///
/// The list round-trips through a comma-delimited string. It contains one
/// marker entry standing for the currently opened primary archive.
///
/// # Examples
///
/// ```
/// use mapx_core::SourceList;
/// use mapx_core::config::SourceEntry;
///
/// let list = SourceList::load("patch.zip,<primary>:old.zip,base.zip", "data.zip");
/// assert_eq!(list.entries()[0], SourceEntry::Primary("data.zip".into()));
/// assert_eq!(list.to_string(), "<primary>:data.zip,patch.zip,base.zip");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    entries: Vec<SourceEntry>,
}

impl SourceList {
    /// Creates a list from explicit entries.
    #[must_use]
    pub fn new(entries: Vec<SourceEntry>) -> Self {
        Self { entries }
    }

    /// Parses a persisted list without adjusting its markers.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(LIST_DELIMITER)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.strip_prefix(PRIMARY_MARKER).map_or_else(
                    || SourceEntry::Path(item.to_string()),
                    |name| SourceEntry::Primary(name.to_string()),
                )
            })
            .collect();
        Self { entries }
    }

    /// Parses a persisted list for the given primary archive.
    ///
    /// A marker names the primary when it holds the same path or the same
    /// file name, so a list saved with `<primary>:data.zip` keeps its slot
    /// for `/games/ro/data.zip`. The matching marker is rebound to
    /// `primary_name`. Other markers are dropped, and if none matches a
    /// marker for the current primary is inserted first.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapx_core::SourceList;
    ///
    /// let list = SourceList::load("/games/ro/patch,<primary>:data.zip", "/games/ro/data.zip");
    /// assert_eq!(list.to_string(), "/games/ro/patch,<primary>:/games/ro/data.zip");
    /// ```
    #[must_use]
    pub fn load(raw: &str, primary_name: &str) -> Self {
        let parsed = Self::parse(raw);
        let slot = parsed.entries.iter().position(|entry| {
            matches!(entry, SourceEntry::Primary(name) if names_primary(name, primary_name))
        });

        let mut entries = Vec::with_capacity(parsed.entries.len() + 1);
        for (index, entry) in parsed.entries.into_iter().enumerate() {
            match entry {
                SourceEntry::Primary(_) if slot == Some(index) => {
                    entries.push(SourceEntry::Primary(primary_name.to_string()));
                }
                SourceEntry::Primary(stale) => {
                    tracing::debug!(
                        marker = %stale,
                        primary = primary_name,
                        "dropping marker for another archive"
                    );
                }
                path @ SourceEntry::Path(_) => entries.push(path),
            }
        }
        if slot.is_none() {
            entries.insert(0, SourceEntry::Primary(primary_name.to_string()));
        }
        Self { entries }
    }

    /// Returns the entries, highest priority first.
    #[must_use]
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Appends a source with the lowest priority.
    pub fn push(&mut self, path: impl Into<String>) {
        self.entries.push(SourceEntry::Path(path.into()));
    }

    /// Removes a path entry. The primary marker cannot be removed.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, SourceEntry::Path(p) if p == path));
        before != self.entries.len()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for SourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                write!(f, "{LIST_DELIMITER}")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
