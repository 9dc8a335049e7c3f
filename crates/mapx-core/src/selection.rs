//! Tri-state selection over a [`DependencyTree`].
//!
//! Checking or unchecking a node forces every enabled descendant to the same
//! state, then ancestors are recomputed: a parent is checked iff all of its
//! enabled children are checked, unchecked iff all are unchecked, and
//! indeterminate otherwise. Disabled nodes are skipped everywhere. A parent
//! without enabled children keeps its state.

use crate::path::NormalizedPath;
use crate::resolver::SourceHandle;
use crate::tree::CheckState;
use crate::tree::DependencyTree;
use crate::tree::NodeId;

/// A selected resource and the source it resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Node the entry was collected from.
    pub node: NodeId,
    /// Logical relative path.
    pub relative_path: String,
    /// Source that won the lookup during the walk.
    pub source: SourceHandle,
}

/// Checked resources in depth-first order.
///
/// Shared dependencies appear once per checked occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<SelectedFile>,
}

impl SelectionSet {
    /// Returns the entries.
    #[must_use]
    pub fn entries(&self) -> &[SelectedFile] {
        &self.entries
    }

    /// Returns the number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any entry has this path.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        let key = NormalizedPath::new(path);
        self.entries
            .iter()
            .any(|entry| NormalizedPath::new(&entry.relative_path) == key)
    }

    /// Iterates the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, SelectedFile> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a SelectedFile;
    type IntoIter = std::slice::Iter<'a, SelectedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl DependencyTree {
    fn is_enabled(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.enabled())
    }

    /// Sets a state without touching neighbours. Returns `true` on change.
    fn assign(&mut self, id: NodeId, state: CheckState) -> bool {
        match self.node_mut(id) {
            Some(node) if node.enabled() && node.state != state => {
                node.state = state;
                true
            }
            _ => false,
        }
    }

    /// Checks or unchecks a node and all of its enabled descendants, then
    /// recomputes its ancestors.
    ///
    /// Returns `true` if any state changed. Disabled and unknown nodes are
    /// ignored.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> bool {
        if !self.is_enabled(id) {
            return false;
        }

        let state = CheckState::from_checked(checked);
        let mut changed = false;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.is_enabled(current) {
                continue;
            }
            changed |= self.assign(current, state);
            stack.extend_from_slice(self.children(current));
        }

        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            changed |= self.propagate_up(parent);
        }
        changed
    }

    /// Applies [`set_checked`](Self::set_checked) to every occurrence of a
    /// path. Returns the number of occurrences whose selection changed.
    pub fn set_checked_path(&mut self, path: &str, checked: bool) -> usize {
        let key = NormalizedPath::new(path);
        let matches: Vec<NodeId> = self
            .iter_depth_first()
            .filter(|(_, node)| node.enabled() && NormalizedPath::new(&node.relative_path) == key)
            .map(|(id, _)| id)
            .collect();

        matches
            .into_iter()
            .filter(|&id| self.set_checked(id, checked))
            .count()
    }

    /// Recomputes `id` from its enabled children and continues with its
    /// ancestors until a state stays the same.
    ///
    /// Returns `true` if any state changed.
    pub fn propagate_up(&mut self, id: NodeId) -> bool {
        let mut changed = false;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(state) = self.derived_state(node_id) else {
                break;
            };
            if !self.assign(node_id, state) {
                break;
            }
            changed = true;
            current = self.node(node_id).and_then(|n| n.parent);
        }
        changed
    }

    /// State implied by the enabled children, `None` if there are none.
    fn derived_state(&self, id: NodeId) -> Option<CheckState> {
        if !self.is_enabled(id) {
            return None;
        }
        let mut states = self
            .children(id)
            .iter()
            .filter_map(|&child| self.node(child))
            .filter(|child| child.enabled())
            .map(|child| child.state);

        let first = states.next()?;
        if states.all(|state| state == first) && first != CheckState::Indeterminate {
            Some(first)
        } else {
            Some(CheckState::Indeterminate)
        }
    }

    /// Selects a node's own file and those of its direct children whose
    /// enabled children are all checked.
    ///
    /// The node is checked. Each enabled child becomes checked if all of
    /// its enabled children are checked and indeterminate otherwise. The
    /// node and its ancestors are then recomputed.
    pub fn select_root_files(&mut self, id: NodeId) {
        if !self.is_enabled(id) {
            return;
        }
        self.assign(id, CheckState::Checked);

        let children = self.children(id).to_vec();
        for child in children {
            if !self.is_enabled(child) {
                continue;
            }
            let all_checked = self
                .children(child)
                .iter()
                .filter_map(|&c| self.node(c))
                .filter(|c| c.enabled())
                .all(|c| c.state == CheckState::Checked);
            let state = if all_checked {
                CheckState::Checked
            } else {
                CheckState::Indeterminate
            };
            self.assign(child, state);
        }

        self.propagate_up(id);
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.propagate_up(parent);
        }
    }

    /// Collects the checked enabled nodes depth-first.
    #[must_use]
    pub fn selection(&self) -> SelectionSet {
        let entries = self
            .iter_depth_first()
            .filter(|(_, node)| node.is_selected())
            .filter_map(|(id, node)| {
                node.resolved.as_ref().map(|resolved| SelectedFile {
                    node: id,
                    relative_path: resolved.relative_path.clone(),
                    source: resolved.source.clone(),
                })
            })
            .collect();
        SelectionSet { entries }
    }
}
