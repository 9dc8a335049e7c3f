//! Tree command implementation.

use super::open_document;
use super::walk;
use crate::cli::TreeArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::output::TreeView;
use anyhow::Result;

pub fn execute(args: &TreeArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let doc = open_document(&args.sources)?;
    walk(&doc, &args.file, &args.sources)?;

    let view = add_archive_context(
        doc.with_tree(|tree| TreeView::new(&args.file, tree, args.selected)),
        &args.sources.archive,
    )?;
    formatter.format_tree(&view)
}
