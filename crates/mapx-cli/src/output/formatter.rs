//! Output formatter trait and the views it renders.

use anyhow::Result;
use mapx_core::CheckState;
use mapx_core::DependencyTree;
use mapx_core::ExportReport;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a dependency tree
    fn format_tree(&self, view: &TreeView) -> Result<()>;

    /// Format export result
    fn format_export_result(&self, dest: &Path, report: &ExportReport) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// One tree node, flattened in depth-first order.
#[derive(Debug, Serialize)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub kind: String,
    pub state: &'static str,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Printable form of a dependency tree.
#[derive(Debug, Serialize)]
pub struct TreeView {
    pub file: String,
    pub resources: usize,
    pub selected: usize,
    pub missing: usize,
    pub rows: Vec<TreeRow>,
}

impl TreeView {
    /// Flattens `tree`. With `selected_only`, rows that would not be
    /// exported are left out.
    pub fn new(file: &str, tree: &DependencyTree, selected_only: bool) -> Self {
        let rows = tree
            .iter_depth_first()
            .filter(|(_, node)| !selected_only || node.is_selected())
            .map(|(id, node)| TreeRow {
                depth: tree.depth(id),
                name: node.name.clone(),
                path: node.relative_path.clone(),
                kind: node.kind.to_string(),
                state: state_label(node.state),
                found: node.enabled(),
                source: node.resolved.as_ref().map(|r| r.source.name.clone()),
                note: node.note.as_ref().map(ToString::to_string),
            })
            .collect();

        Self {
            file: file.to_string(),
            resources: tree.len(),
            selected: tree.selection().len(),
            missing: tree.iter_depth_first().filter(|(_, n)| !n.enabled()).count(),
            rows,
        }
    }
}

const fn state_label(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "checked",
        CheckState::Unchecked => "unchecked",
        CheckState::Indeterminate => "partial",
    }
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Partial,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
        }
    }

    pub fn partial(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Partial,
            data: Some(data),
        }
    }
}
