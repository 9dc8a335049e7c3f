//! Dependency tree produced by a walk.
//!
//! The tree is an arena: nodes live in one vector and refer to each other by
//! [`NodeId`]. A resource referenced from several parents appears once per
//! parent, and each occurrence carries its own selection state.

use std::fmt;

use crate::formats::ResourceKind;
use crate::resolver::Generation;
use crate::resolver::ResolvedPath;

/// Index of a node in its [`DependencyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tri-state selection flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    /// Selected for export.
    Checked,
    /// Not selected.
    Unchecked,
    /// Some but not all enabled descendants are selected.
    Indeterminate,
}

impl CheckState {
    /// Returns the explicit state for a check or uncheck action.
    #[must_use]
    pub const fn from_checked(checked: bool) -> Self {
        if checked { Self::Checked } else { Self::Unchecked }
    }
}

/// Why an enabled node has no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeNote {
    /// The resource bytes could not be read or parsed.
    ParseFailed(String),
    /// The resource is already an ancestor of this node.
    CycleDetected,
    /// The node sits at the configured maximum depth.
    DepthLimitReached,
}

impl fmt::Display for NodeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailed(reason) => write!(f, "unreadable: {reason}"),
            Self::CycleDetected => f.write_str("cyclic reference"),
            Self::DepthLimitReached => f.write_str("depth limit reached"),
        }
    }
}

/// One discovered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// Name as referenced by the parent (or the root name).
    pub name: String,
    /// Directory hint joined with the name.
    pub relative_path: String,
    /// Winning source, or `None` if no source holds the resource.
    pub resolved: Option<ResolvedPath>,
    /// Kind derived from the extension.
    pub kind: ResourceKind,
    /// Children in reference order.
    pub children: Vec<NodeId>,
    /// Parent node, `None` for roots.
    pub parent: Option<NodeId>,
    /// Selection state. Meaningless for disabled nodes.
    pub state: CheckState,
    /// Why an enabled node stopped expanding, if it did.
    pub note: Option<NodeNote>,
}

impl ResourceNode {
    /// Returns `true` if the resource was found. Disabled nodes are never
    /// selected, toggled or exported.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.resolved.is_some()
    }

    /// Returns `true` if the node is enabled and checked.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.enabled() && self.state == CheckState::Checked
    }

    /// Returns `true` if the node has children.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Rooted forest of discovered resources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTree {
    pub(crate) nodes: Vec<ResourceNode>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) generation: Generation,
}

impl DependencyTree {
    /// Creates an empty tree for a configuration generation.
    #[must_use]
    pub const fn new(generation: Generation) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            generation,
        }
    }

    /// Returns the generation the tree was built for.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the root nodes in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.0)
    }

    /// Returns a node's state.
    #[must_use]
    pub fn state(&self, id: NodeId) -> Option<CheckState> {
        self.node(id).map(|node| node.state)
    }

    /// Returns a node's children, empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| &node.children)
    }

    /// Returns the number of edges between a node and its root.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).and_then(|n| n.parent);
        }
        depth
    }

    /// Iterates all nodes depth-first in reference order.
    #[must_use]
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Appends a node below `parent`, or as a new root.
    pub(crate) fn push(&mut self, mut node: ResourceNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(node);
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(id.0)
    }
}

/// Depth-first iterator over a [`DependencyTree`].
#[derive(Debug)]
pub struct DepthFirst<'a> {
    tree: &'a DependencyTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (NodeId, &'a ResourceNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, node))
    }
}
