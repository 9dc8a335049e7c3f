//! Subcommand implementations.

pub mod completion;
pub mod export;
pub mod tree;

use crate::cli::SourceArgs;
use crate::error::add_archive_context;
use anyhow::Result;
use anyhow::bail;
use mapx_core::CancellationToken;
use mapx_core::Document;
use mapx_core::SourceList;
use mapx_core::WalkConfig;
use mapx_core::WalkSummary;
use mapx_core::config::SourceEntry;
use mapx_core::source::open_source;

/// Opens the primary archive and installs the source list.
pub fn open_document(args: &SourceArgs) -> Result<Document> {
    let primary = add_archive_context(open_source(&args.archive), &args.archive)?;
    let config = WalkConfig::default().with_max_depth(usize::from(args.max_depth));
    let doc = Document::new(primary, &args.archive).with_walk_config(config);

    if let Some(raw) = &args.sources {
        doc.load_source_list(raw);
    } else if !args.source.is_empty() {
        let mut entries: Vec<SourceEntry> = args
            .source
            .iter()
            .map(|path| SourceEntry::Path(path.display().to_string()))
            .collect();
        entries.push(SourceEntry::Primary(doc.primary_name().to_string()));
        doc.set_source_list(SourceList::new(entries));
    }

    tracing::debug!(sources = %doc.source_list(), "source list");
    Ok(doc)
}

/// Walks `file` and leaves the tree in the document.
pub fn walk(doc: &Document, file: &str, args: &SourceArgs) -> Result<()> {
    let summary = add_archive_context(doc.walk(file, &CancellationToken::new()), &args.archive)?;
    match summary {
        WalkSummary::Built { nodes, .. } => {
            tracing::debug!(nodes, "dependency tree built");
            Ok(())
        }
        WalkSummary::Stale { .. } | WalkSummary::Cancelled => {
            bail!("walk of '{file}' was interrupted")
        }
    }
}
