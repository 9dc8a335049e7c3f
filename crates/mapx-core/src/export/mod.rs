//! Export of the selected resources.
//!
//! An export collects every checked, enabled node of a tree, keeps the first
//! occurrence of each relative path, prepares the destination directories,
//! and copies each file's bytes freshly resolved through the resolver.
//!
//! Exports are best-effort: a file that cannot be resolved, validated or
//! written is recorded in [`ExportReport::failures`] and the remaining files
//! are still attempted.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crate::MapError;
use crate::Result;
use crate::path::NormalizedPath;
use crate::path::SafeRelativePath;
use crate::resolver::LayeredResolver;
use crate::tree::DependencyTree;

pub mod progress;
pub mod sink;

pub use progress::NoopProgress;
pub use progress::Progress;
pub use progress::ProgressCallback;
pub use sink::DirectorySink;
pub use sink::ExportSink;
pub use sink::StreamSink;

/// A file that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    /// Relative path of the file.
    pub path: String,
    /// Why it failed.
    pub reason: String,
}

/// Report of an export operation.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Number of files written.
    pub files_written: usize,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Number of directories created.
    pub directories_created: usize,
    /// Selected occurrences skipped because their path was already exported.
    pub duplicates_skipped: usize,
    /// Files that could not be exported.
    pub failures: Vec<ExportFailure>,
    /// First destination directory used, for opening the result.
    pub open_target: Option<PathBuf>,
    /// Duration of the export.
    pub duration: Duration,
}

impl ExportReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if every selected file was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the number of distinct files attempted.
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.files_written + self.failures.len()
    }

    fn fail(&mut self, path: &str, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(path, %reason, "failed to export file");
        self.failures.push(ExportFailure {
            path: path.to_string(),
            reason,
        });
    }
}

/// Copies selected resources to an [`ExportSink`].
#[derive(Debug, Clone, Copy)]
pub struct Exporter<'a> {
    resolver: &'a LayeredResolver,
}

impl<'a> Exporter<'a> {
    /// Creates an exporter reading through `resolver`.
    #[must_use]
    pub const fn new(resolver: &'a LayeredResolver) -> Self {
        Self { resolver }
    }

    /// Exports the checked resources of `tree`.
    ///
    /// Progress starts as [`Progress::Indeterminate`], then rises after each
    /// attempted file and ends at 100.
    ///
    /// # Errors
    ///
    /// Returns an error only if the destination directories cannot be
    /// prepared. Per-file failures are listed in the report.
    pub fn export(
        &self,
        tree: &DependencyTree,
        sink: &mut dyn ExportSink,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExportReport> {
        let started = Instant::now();
        let mut report = ExportReport::new();
        progress.on_progress(Progress::Indeterminate);

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for entry in &tree.selection() {
            if !seen.insert(NormalizedPath::new(&entry.relative_path)) {
                report.duplicates_skipped += 1;
                continue;
            }
            match SafeRelativePath::validate(&entry.relative_path) {
                Ok(path) => files.push(path),
                Err(e) => report.fail(&entry.relative_path, e),
            }
        }

        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in &files {
            let dir = file.parent().unwrap_or_default();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        report.directories_created = sink.prepare_directories(&dirs).map_err(MapError::Io)?;
        report.open_target = sink
            .location()
            .zip(dirs.first())
            .map(|(root, dir)| root.join(dir));

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            progress.on_file_start(file.as_str(), total, index + 1);

            match self.copy(file, sink) {
                Ok(bytes) => {
                    report.files_written += 1;
                    report.bytes_written += bytes;
                    progress.on_file_complete(file.as_str(), bytes);
                }
                Err(e) => report.fail(file.as_str(), e),
            }

            progress.on_progress(Progress::of(index + 1, total));
        }
        if total == 0 {
            progress.on_progress(Progress::of(0, 0));
        }

        report.duration = started.elapsed();
        progress.on_complete();

        tracing::info!(
            files = report.files_written,
            failed = report.failures.len(),
            bytes = report.bytes_written,
            "export finished"
        );
        Ok(report)
    }

    fn copy(&self, file: &SafeRelativePath, sink: &mut dyn ExportSink) -> Result<u64> {
        let data = self.resolver.resolve(file.as_str())?;
        Ok(sink.write_file(file, &data)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use crate::formats::ExtractorSet;
    use crate::resolver::Generation;
    use crate::resolver::ResolverBuilder;
    use crate::source::MemorySource;
    use crate::test_utils::RsmFixture;
    use crate::test_utils::RswFixture;
    use crate::walker::Walker;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Vec<Progress>);

    impl ProgressCallback for Recorder {
        fn on_progress(&mut self, progress: Progress) {
            self.0.push(progress);
        }
        fn on_file_start(&mut self, _path: &str, _total: usize, _current: usize) {}
        fn on_file_complete(&mut self, _path: &str, _bytes: u64) {}
        fn on_complete(&mut self) {}
    }

    fn world_source() -> MemorySource {
        MemorySource::new("base")
            .with_file("data\\w.rsw", RswFixture::new(2, 1).model("a.rsm").model("b.rsm").encode())
            .with_file("data\\model\\a.rsm", RsmFixture::v1(4).texture("shared.bmp").encode())
            .with_file("data\\model\\b.rsm", RsmFixture::v1(4).texture("shared.bmp").texture("own.bmp").encode())
            .with_file("data\\texture\\shared.bmp", b"shared".to_vec())
            .with_file("data\\texture\\own.bmp", b"own".to_vec())
    }

    fn walk(resolver: &LayeredResolver) -> DependencyTree {
        let extractors = ExtractorSet::default();
        let config = WalkConfig::default();
        Walker::new(resolver, &extractors, &config)
            .walk("w.rsw", "data\\", true, &|| false)
            .tree
    }

    #[test]
    fn test_shared_dependency_written_once() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(Arc::new(world_source()))
            .build();
        let tree = walk(&resolver);
        let temp = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(temp.path());
        let mut progress = Recorder::default();

        let report = Exporter::new(&resolver)
            .export(&tree, &mut sink, &mut progress)
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.files_written, 5);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(
            std::fs::read(temp.path().join("data").join("texture").join("shared.bmp")).unwrap(),
            b"shared"
        );
        assert_eq!(report.open_target, Some(temp.path().join("data")));

        assert_eq!(progress.0.first(), Some(&Progress::Indeterminate));
        assert_eq!(progress.0.last(), Some(&Progress::Percent(100.0)));
        let values: Vec<f32> = progress.0.iter().map(|p| p.value()).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_failures_do_not_stop_batch() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(Arc::new(world_source()))
            .build();
        let tree = walk(&resolver);

        // Every source was removed since the walk.
        let later = ResolverBuilder::new(Generation(1))
            .source(Arc::new(MemorySource::new("empty")))
            .build();
        let temp = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(temp.path());

        let report = Exporter::new(&later)
            .export(&tree, &mut sink, &mut NoopProgress)
            .unwrap();
        assert_eq!(report.files_written, 0);
        assert_eq!(report.failures.len(), 5);
        assert!(!report.is_complete());
        assert!(report.failures[0].reason.contains("not found"));
    }

    #[test]
    fn test_empty_selection_reports_done() {
        let resolver = ResolverBuilder::new(Generation(0))
            .source(Arc::new(world_source()))
            .build();
        let mut tree = walk(&resolver);
        let root = tree.roots()[0];
        tree.set_checked(root, false);

        let mut progress = Recorder::default();
        let mut sink = StreamSink::new(|_| Ok(Box::new(std::io::sink())));
        let report = Exporter::new(&resolver)
            .export(&tree, &mut sink, &mut progress)
            .unwrap();
        assert_eq!(report.files_attempted(), 0);
        assert_eq!(progress.0, [Progress::Indeterminate, Progress::Percent(100.0)]);
        assert!(report.open_target.is_none());
    }
}
