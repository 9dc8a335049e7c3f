//! Recursive dependency discovery.
//!
//! The walker resolves a root resource, extracts its references, and
//! recurses into each of them depth-first. Missing resources become disabled
//! leaves; unreadable resources become enabled leaves with a
//! [`NodeNote`]. Neither stops the rest of the walk.
//!
//! Cancellation is cooperative: the predicate is polled before every
//! resolve and before every descent. A cancelled walk returns the nodes
//! built so far, each complete with the children discovered before the
//! checkpoint that observed cancellation.

use std::collections::HashMap;
use std::time::Instant;

use crate::config::WalkConfig;
use crate::formats::ExtractorSet;
use crate::formats::ResourceKind;
use crate::formats::dedup_names;
use crate::path;
use crate::path::NormalizedPath;
use crate::resolver::LayeredResolver;
use crate::tree::CheckState;
use crate::tree::DependencyTree;
use crate::tree::NodeId;
use crate::tree::NodeNote;
use crate::tree::ResourceNode;

/// A root resource to walk from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSpec {
    /// Resource name.
    pub name: String,
    /// Directory hint the name is joined with.
    pub dir: String,
    /// Initial selection of the root and everything below it.
    pub checked: bool,
}

impl RootSpec {
    /// Creates a root.
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            checked,
        }
    }
}

/// Result of a walk.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    /// Nodes discovered so far.
    pub tree: DependencyTree,
    /// `true` if the cancellation predicate stopped the walk.
    pub cancelled: bool,
}

/// Plans the roots for an opened resource.
///
/// Models and effects are walked on their own from their directory. Any
/// other file is treated as part of a map: the ground and world files
/// sharing its stem are walked from the map directory, and only the one
/// matching the opened file starts checked.
///
/// # Examples
///
/// ```
/// use mapx_core::WalkConfig;
/// use mapx_core::walker::plan_roots;
///
/// let roots = plan_roots("data\\prontera.rsw", &WalkConfig::default());
/// assert_eq!(roots[0].name, "prontera.gnd");
/// assert!(!roots[0].checked);
/// assert_eq!(roots[1].name, "prontera.rsw");
/// assert!(roots[1].checked);
///
/// let roots = plan_roots("data\\model\\tree.rsm", &WalkConfig::default());
/// assert_eq!(roots.len(), 1);
/// assert_eq!(roots[0].dir, "data\\model\\");
/// ```
#[must_use]
pub fn plan_roots(opened_file: &str, config: &WalkConfig) -> Vec<RootSpec> {
    let extension = path::extension(opened_file);
    match extension.as_deref() {
        Some("rsm" | "rsm2" | "str") => vec![RootSpec::new(
            path::file_name(opened_file),
            path::parent_dir(opened_file),
            true,
        )],
        other => {
            let stem = path::file_stem(opened_file);
            vec![
                RootSpec::new(format!("{stem}.gnd"), &config.map_dir, other == Some("gnd")),
                RootSpec::new(format!("{stem}.rsw"), &config.map_dir, other == Some("rsw")),
            ]
        }
    }
}

struct Cancelled;

struct WalkState<'c> {
    tree: DependencyTree,
    cancel: &'c dyn Fn() -> bool,
    memo: HashMap<NormalizedPath, Result<Vec<String>, String>>,
    ancestors: Vec<NormalizedPath>,
    parsed: usize,
}

impl WalkState<'_> {
    fn checkpoint(&self) -> Result<(), Cancelled> {
        if (self.cancel)() { Err(Cancelled) } else { Ok(()) }
    }
}

/// Builds dependency trees against one resolver snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    resolver: &'a LayeredResolver,
    extractors: &'a ExtractorSet,
    config: &'a WalkConfig,
}

impl<'a> Walker<'a> {
    /// Creates a walker.
    #[must_use]
    pub const fn new(
        resolver: &'a LayeredResolver,
        extractors: &'a ExtractorSet,
        config: &'a WalkConfig,
    ) -> Self {
        Self {
            resolver,
            extractors,
            config,
        }
    }

    /// Walks a single root.
    pub fn walk(
        &self,
        name: &str,
        dir: &str,
        checked: bool,
        cancel: &dyn Fn() -> bool,
    ) -> WalkOutcome {
        self.walk_roots(&[RootSpec::new(name, dir, checked)], cancel)
    }

    /// Walks several roots into one forest, in order.
    pub fn walk_roots(&self, roots: &[RootSpec], cancel: &dyn Fn() -> bool) -> WalkOutcome {
        let started = Instant::now();
        let mut state = WalkState {
            tree: DependencyTree::new(self.resolver.generation()),
            cancel,
            memo: HashMap::new(),
            ancestors: Vec::new(),
            parsed: 0,
        };

        let mut cancelled = false;
        for root in roots {
            if self
                .add_node(&mut state, &root.name, &root.dir, root.checked, None)
                .is_err()
            {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            tracing::info!(nodes = state.tree.len(), "walk cancelled");
        } else {
            tracing::info!(
                roots = roots.len(),
                nodes = state.tree.len(),
                parsed = state.parsed,
                generation = self.resolver.generation().0,
                elapsed = ?started.elapsed(),
                "walk finished"
            );
        }

        WalkOutcome {
            tree: state.tree,
            cancelled,
        }
    }

    fn add_node(
        &self,
        state: &mut WalkState<'_>,
        name: &str,
        dir: &str,
        checked: bool,
        parent: Option<NodeId>,
    ) -> Result<(), Cancelled> {
        state.checkpoint()?;

        let relative_path = path::join(dir, name);
        let kind = ResourceKind::from_path(&relative_path);
        let resolved = self.resolver.resolve_path(&relative_path);
        let source = resolved.as_ref().map(|r| r.source.id);

        let id = state.tree.push(
            ResourceNode {
                name: name.to_string(),
                relative_path: relative_path.clone(),
                resolved,
                kind,
                children: Vec::new(),
                parent,
                state: CheckState::from_checked(checked),
                note: None,
            },
            parent,
        );

        let Some(source) = source else {
            tracing::debug!(path = %relative_path, "missing resource");
            return Ok(());
        };
        tracing::debug!(path = %relative_path, %kind, "found resource");

        let Some(extractor) = self.extractors.get(kind) else {
            return Ok(());
        };

        let key = NormalizedPath::new(&relative_path);
        if state.ancestors.contains(&key) {
            tracing::warn!(path = %relative_path, "cyclic reference, not descending");
            set_note(state, id, NodeNote::CycleDetected);
            return Ok(());
        }
        if state.ancestors.len() >= self.config.max_depth {
            tracing::warn!(path = %relative_path, depth = state.ancestors.len(), "depth limit reached");
            set_note(state, id, NodeNote::DepthLimitReached);
            return Ok(());
        }

        let references = match state.memo.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let extracted = self
                    .resolver
                    .read(source, &relative_path)
                    .and_then(|bytes| Ok(extractor.extract(&bytes)?))
                    .map(dedup_names)
                    .map_err(|e| e.to_string());
                state.parsed += 1;
                state.memo.insert(key.clone(), extracted.clone());
                extracted
            }
        };

        let references = match references {
            Ok(references) => references,
            Err(reason) => {
                tracing::warn!(path = %relative_path, error = %reason, "failed to extract references");
                set_note(state, id, NodeNote::ParseFailed(reason));
                return Ok(());
            }
        };

        let child_dir = kind.reference_dir(&relative_path, self.config).to_string();
        state.ancestors.push(key);
        let result = references.iter().try_for_each(|reference| {
            state.checkpoint()?;
            self.add_node(state, reference, &child_dir, checked, Some(id))
        });
        state.ancestors.pop();
        result
    }
}

fn set_note(state: &mut WalkState<'_>, id: NodeId, note: NodeNote) {
    if let Some(node) = state.tree.node_mut(id) {
        node.note = Some(note);
    }
}
