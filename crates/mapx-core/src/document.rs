//! Per-document orchestration of walks and exports.
//!
//! A [`Document`] ties one opened primary archive to its configured source
//! list, the resolver built from it, and the last dependency tree. Walks and
//! exports are serialized in two ways:
//!
//! - an advisory busy gate rejects a second walk or export while one runs
//!   ([`MapError::ConcurrentOperation`]), it never queues;
//! - the document state sits behind a mutex, so selection changes never
//!   interleave with an in-flight walk.
//!
//! Changing the source list bumps a generation counter instead of touching
//! the resolver in use. The resolver is rebuilt before the next walk, and a
//! walk that finishes for an outdated generation is discarded.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use crate::MapError;
use crate::Result;
use crate::config::ExportConfig;
use crate::config::SourceEntry;
use crate::config::SourceList;
use crate::config::WalkConfig;
use crate::export::DirectorySink;
use crate::export::ExportReport;
use crate::export::ExportSink;
use crate::export::Exporter;
use crate::export::ProgressCallback;
use crate::formats::ExtractorSet;
use crate::path::SafeRelativePath;
use crate::resolver::Generation;
use crate::resolver::LayeredResolver;
use crate::resolver::ResolverBuilder;
use crate::source::ArchiveSource;
use crate::source::LazySource;
use crate::tree::DependencyTree;
use crate::tree::NodeId;
use crate::walker::Walker;
use crate::walker::plan_roots;

/// Shared flag used to cancel a walk from another thread.
///
/// # Examples
///
/// ```
/// use mapx_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_copy = token.clone();
/// token.cancel();
/// assert!(worker_copy.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held while a walk or export runs. Dropping it releases the document.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Outcome of a document walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkSummary {
    /// The tree was built and stored.
    Built {
        /// Number of nodes in the new tree.
        nodes: usize,
        /// Generation the tree belongs to.
        generation: Generation,
    },
    /// The source list changed during the walk; the result was discarded.
    Stale {
        /// Generation the walk ran against.
        built_for: Generation,
        /// Generation at the time the walk finished.
        current: Generation,
    },
    /// The walk was cancelled; the result was discarded.
    Cancelled,
}

#[derive(Default)]
struct DocumentState {
    resolver: Option<Arc<LayeredResolver>>,
    lazy_sources: HashMap<String, Arc<LazySource>>,
    tree: Option<DependencyTree>,
}

/// One opened primary archive with its source list, resolver and tree.
pub struct Document {
    primary: Arc<dyn ArchiveSource>,
    primary_path: PathBuf,
    walk_config: WalkConfig,
    export_config: ExportConfig,
    extractors: ExtractorSet,
    sources: Mutex<SourceList>,
    generation: AtomicU64,
    busy: Arc<AtomicBool>,
    state: Mutex<DocumentState>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("primary", &self.primary.name())
            .field("primary_path", &self.primary_path)
            .field("generation", &self.generation())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates a document for an opened primary archive.
    ///
    /// `primary_path` locates the archive on disk; exports default to its
    /// directory. The initial source list holds only the primary archive.
    #[must_use]
    pub fn new(primary: Arc<dyn ArchiveSource>, primary_path: impl Into<PathBuf>) -> Self {
        let sources = SourceList::load("", primary.name());
        Self {
            primary,
            primary_path: primary_path.into(),
            walk_config: WalkConfig::default(),
            export_config: ExportConfig::default(),
            extractors: ExtractorSet::default(),
            sources: Mutex::new(sources),
            generation: AtomicU64::new(0),
            busy: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(DocumentState::default()),
        }
    }

    /// Replaces the walk configuration.
    #[must_use]
    pub fn with_walk_config(mut self, config: WalkConfig) -> Self {
        self.walk_config = config;
        self
    }

    /// Replaces the export configuration.
    #[must_use]
    pub fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.export_config = config;
        self
    }

    /// Replaces the reference extractors.
    #[must_use]
    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = extractors;
        self
    }

    /// Returns the name of the primary archive.
    #[must_use]
    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Returns the current configuration generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Returns a copy of the source list.
    #[must_use]
    pub fn source_list(&self) -> SourceList {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the source list and starts a new generation.
    ///
    /// A walk in flight keeps its resolver and is discarded when it
    /// finishes. Returns the new generation.
    pub fn set_source_list(&self, sources: SourceList) -> Generation {
        let mut current = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
        *current = sources;
        let generation = Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1);
        tracing::debug!(generation = generation.0, sources = %current, "source list changed");
        generation
    }

    /// Parses a persisted source list for this document's primary archive
    /// and installs it.
    pub fn load_source_list(&self, raw: &str) -> Generation {
        self.set_source_list(SourceList::load(raw, self.primary.name()))
    }

    /// Returns `true` while a walk or export runs.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks the document busy.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ConcurrentOperation` if it already is.
    pub fn try_begin(&self) -> Result<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MapError::ConcurrentOperation)?;
        Ok(BusyGuard {
            flag: Arc::clone(&self.busy),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the resolver for the current generation, rebuilding it if
    /// the source list changed.
    fn current_resolver(&self, state: &mut DocumentState) -> Arc<LayeredResolver> {
        let (sources, generation) = {
            let sources = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
            (sources.clone(), self.generation())
        };

        if let Some(resolver) = state
            .resolver
            .as_ref()
            .filter(|r| r.generation() == generation)
        {
            return Arc::clone(resolver);
        }

        // Lowest priority registers first so that the first entry wins.
        let mut builder = ResolverBuilder::new(generation).primary(Arc::clone(&self.primary));
        for entry in sources.entries().iter().rev() {
            builder = match entry {
                SourceEntry::Primary(_) => builder.primary_slot(),
                SourceEntry::Path(path) => {
                    let source = state
                        .lazy_sources
                        .entry(path.clone())
                        .or_insert_with(|| Arc::new(LazySource::new(path)));
                    builder.source(Arc::clone(source) as Arc<dyn ArchiveSource>)
                }
            };
        }

        let resolver = Arc::new(builder.build());
        state.resolver = Some(Arc::clone(&resolver));
        resolver
    }

    /// Walks the map resources of `opened_file` and stores the tree.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ConcurrentOperation` if the document is busy.
    pub fn walk(&self, opened_file: &str, cancel: &CancellationToken) -> Result<WalkSummary> {
        let _guard = self.try_begin()?;
        Ok(self.run_walk(opened_file, cancel))
    }

    /// Starts [`walk`](Self::walk) on a background thread.
    ///
    /// The busy check happens before the thread starts, so a rejected
    /// request fails here rather than in the handle.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ConcurrentOperation` if the document is busy, or an
    /// I/O error if the thread cannot be spawned.
    pub fn spawn_walk(
        self: &Arc<Self>,
        opened_file: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<WalkSummary>> {
        let guard = self.try_begin()?;
        let document = Arc::clone(self);
        let opened_file = opened_file.into();
        let handle = thread::Builder::new()
            .name("mapx-walk".to_string())
            .spawn(move || {
                let _guard = guard;
                document.run_walk(&opened_file, &cancel)
            })?;
        Ok(handle)
    }

    fn run_walk(&self, opened_file: &str, cancel: &CancellationToken) -> WalkSummary {
        let mut state = self.lock_state();
        // The previous tree belongs to another root or source list.
        state.tree = None;
        if cancel.is_cancelled() {
            return WalkSummary::Cancelled;
        }

        let resolver = self.current_resolver(&mut state);
        let roots = plan_roots(opened_file, &self.walk_config);
        tracing::info!(file = opened_file, roots = roots.len(), "walking dependencies");

        let outcome = Walker::new(&resolver, &self.extractors, &self.walk_config)
            .walk_roots(&roots, &|| cancel.is_cancelled());
        if outcome.cancelled {
            return WalkSummary::Cancelled;
        }

        let built_for = outcome.tree.generation();
        let current = self.generation();
        if built_for != current {
            tracing::info!(
                built_for = built_for.0,
                current = current.0,
                "discarding walk for outdated source list"
            );
            return WalkSummary::Stale { built_for, current };
        }

        let nodes = outcome.tree.len();
        state.tree = Some(outcome.tree);
        WalkSummary::Built {
            nodes,
            generation: current,
        }
    }

    /// Returns `true` if a tree is stored and matches the current source
    /// list.
    #[must_use]
    pub fn is_tree_current(&self) -> bool {
        let generation = self.generation();
        self.lock_state()
            .tree
            .as_ref()
            .is_some_and(|tree| tree.generation() == generation)
    }

    /// Runs `f` on the stored tree.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NoTree` if no walk has completed.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DependencyTree) -> R) -> Result<R> {
        self.lock_state().tree.as_ref().map(f).ok_or(MapError::NoTree)
    }

    /// Runs `f` on the stored tree with write access, for selection changes.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NoTree` if no walk has completed.
    pub fn with_tree_mut<R>(&self, f: impl FnOnce(&mut DependencyTree) -> R) -> Result<R> {
        self.lock_state().tree.as_mut().map(f).ok_or(MapError::NoTree)
    }

    /// Returns the directory exports go to by default.
    #[must_use]
    pub fn default_export_dir(&self) -> PathBuf {
        self.export_config.default_dir(&self.primary_path)
    }

    /// Exports the checked resources below `dest`.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ConcurrentOperation` if the document is busy,
    /// `MapError::NoTree` if no walk has completed, `MapError::StaleTree` if
    /// the source list changed since the walk, or an I/O error if the
    /// destination cannot be prepared.
    pub fn export_to(&self, dest: &Path, progress: &mut dyn ProgressCallback) -> Result<ExportReport> {
        self.export_with(&mut DirectorySink::new(dest), progress)
    }

    /// Exports the checked resources to a sink.
    ///
    /// # Errors
    ///
    /// See [`export_to`](Self::export_to).
    pub fn export_with(
        &self,
        sink: &mut dyn ExportSink,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExportReport> {
        let _guard = self.try_begin()?;
        self.run_export(sink, progress)
    }

    /// Starts [`export_to`](Self::export_to) on a background thread.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ConcurrentOperation` if the document is busy, or an
    /// I/O error if the thread cannot be spawned.
    pub fn spawn_export(
        self: &Arc<Self>,
        dest: PathBuf,
        mut progress: Box<dyn ProgressCallback>,
    ) -> Result<JoinHandle<Result<ExportReport>>> {
        let guard = self.try_begin()?;
        let document = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("mapx-export".to_string())
            .spawn(move || {
                let _guard = guard;
                document.run_export(&mut DirectorySink::new(dest), progress.as_mut())
            })?;
        Ok(handle)
    }

    fn run_export(
        &self,
        sink: &mut dyn ExportSink,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExportReport> {
        let mut state = self.lock_state();
        let resolver = self.current_resolver(&mut state);
        let tree = state.tree.as_ref().ok_or(MapError::NoTree)?;
        let current = resolver.generation();
        if tree.generation() != current {
            return Err(MapError::StaleTree {
                built_for: tree.generation(),
                current,
            });
        }
        Exporter::new(&resolver).export(tree, sink, progress)
    }

    /// Returns the path of a node inside the primary archive.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NotInPrimary` if the node is missing or resolved
    /// from another source, `MapError::UnknownNode` for foreign ids and
    /// `MapError::NoTree` before the first walk.
    pub fn locate_in_primary(&self, id: NodeId) -> Result<String> {
        self.with_tree(|tree| {
            let node = tree.node(id).ok_or(MapError::UnknownNode(id))?;
            match &node.resolved {
                Some(resolved) if resolved.source.is_primary => Ok(resolved.relative_path.clone()),
                _ => Err(MapError::NotInPrimary {
                    path: node.relative_path.clone(),
                }),
            }
        })?
    }

    /// Returns where a node's file lands when exported below `dest`.
    ///
    /// `None` for missing nodes and paths that cannot be exported.
    #[must_use]
    pub fn export_location(&self, id: NodeId, dest: &Path) -> Option<PathBuf> {
        self.with_tree(|tree| {
            let resolved = tree.node(id)?.resolved.as_ref()?;
            let safe = SafeRelativePath::validate(&resolved.relative_path).ok()?;
            Some(dest.join(safe.to_path_buf()))
        })
        .ok()
        .flatten()
    }

    /// Reads a node's current bytes, for previews.
    ///
    /// # Errors
    ///
    /// Returns `MapError::NotFound` for missing nodes and whatever the
    /// winning source reports on read failure.
    pub fn read_node(&self, id: NodeId) -> Result<Vec<u8>> {
        let mut state = self.lock_state();
        let path = {
            let tree = state.tree.as_ref().ok_or(MapError::NoTree)?;
            let node = tree.node(id).ok_or(MapError::UnknownNode(id))?;
            if !node.enabled() {
                return Err(MapError::NotFound {
                    path: node.relative_path.clone(),
                });
            }
            node.relative_path.clone()
        };
        let resolver = self.current_resolver(&mut state);
        drop(state);
        resolver.resolve(&path)
    }
}
