//! Export command implementation.

use super::open_document;
use super::walk;
use crate::cli::ExportArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::bail;
use mapx_core::CheckState;
use mapx_core::DependencyTree;
use mapx_core::NoopProgress;

pub fn execute(
    args: &ExportArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let archive = &args.sources.archive;
    let doc = open_document(&args.sources)?;
    walk(&doc, &args.file, &args.sources)?;

    let unmatched = add_archive_context(
        doc.with_tree_mut(|tree| adjust_selection(tree, args.root_files_only, &args.exclude)),
        archive,
    )?;
    for path in unmatched {
        formatter.format_warning(&format!("--exclude {path} matched no selected resource"));
    }

    let dest = args
        .output_dir
        .clone()
        .unwrap_or_else(|| doc.default_export_dir());

    let report = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Preparing export");
        add_archive_context(doc.export_to(&dest, &mut progress), archive)?
    } else {
        add_archive_context(doc.export_to(&dest, &mut NoopProgress), archive)?
    };

    for failure in &report.failures {
        formatter.format_warning(&format!("{}: {}", failure.path, failure.reason));
    }
    formatter.format_export_result(&dest, &report)?;

    if !report.is_complete() {
        bail!(
            "{} of {} files could not be exported",
            report.failures.len(),
            report.files_attempted()
        );
    }
    Ok(())
}

/// Applies the selection flags. Returns the exclusions that changed nothing.
fn adjust_selection<'a>(
    tree: &mut DependencyTree,
    root_files_only: bool,
    exclude: &'a [String],
) -> Vec<&'a str> {
    if root_files_only {
        for root in tree.roots().to_vec() {
            let wanted = tree
                .node(root)
                .is_some_and(|node| node.enabled() && node.state != CheckState::Unchecked);
            if wanted {
                tree.set_checked(root, false);
                tree.select_root_files(root);
            }
        }
    }

    exclude
        .iter()
        .filter(|path| tree.set_checked_path(path, false) == 0)
        .map(String::as_str)
        .collect()
}
