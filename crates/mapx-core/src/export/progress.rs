//! Export progress reporting.

use std::fmt;

/// Fraction of an export that is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// The export is starting and the amount of work is not known yet.
    Indeterminate,
    /// Percentage of files attempted, `0.0..=100.0`.
    Percent(f32),
}

impl Progress {
    /// Returns the percentage, or `-1.0` while indeterminate.
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::Indeterminate => -1.0,
            Self::Percent(p) => p,
        }
    }

    /// Progress after `done` of `total` files.
    #[must_use]
    pub fn of(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self::Percent(100.0);
        }
        Self::Percent((done as f32 / total as f32 * 100.0).min(100.0))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indeterminate => f.write_str("starting"),
            Self::Percent(p) => write!(f, "{p:.0}%"),
        }
    }
}

/// Callback trait for progress reporting during exports.
///
/// The trait requires `Send` so that exports can run on a worker thread.
///
/// # Examples
///
/// ```
/// use mapx_core::export::Progress;
/// use mapx_core::export::ProgressCallback;
///
/// struct PrintProgress;
///
/// impl ProgressCallback for PrintProgress {
///     fn on_progress(&mut self, progress: Progress) {
///         println!("{progress}");
///     }
///
///     fn on_file_start(&mut self, path: &str, total: usize, current: usize) {
///         println!("{current}/{total}: {path}");
///     }
///
///     fn on_file_complete(&mut self, _path: &str, _bytes: u64) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called when the overall progress changes. Values never decrease.
    fn on_progress(&mut self, progress: Progress);

    /// Called before a file is written.
    ///
    /// # Arguments
    ///
    /// * `path` - Relative path of the file
    /// * `total` - Number of distinct files in the export
    /// * `current` - Current file number (1-indexed)
    fn on_file_start(&mut self, path: &str, total: usize, current: usize);

    /// Called after a file was written.
    fn on_file_complete(&mut self, path: &str, bytes: u64);

    /// Called when the export is finished.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&mut self, _progress: Progress) {}
    fn on_file_start(&mut self, _path: &str, _total: usize, _current: usize) {}
    fn on_file_complete(&mut self, _path: &str, _bytes: u64) {}
    fn on_complete(&mut self) {}
}
