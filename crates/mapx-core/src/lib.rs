//! Dependency resolution and export of map resources across layered
//! archive sources.
//!
//! `mapx-core` discovers every file a game map needs (ground textures,
//! world models, model textures and effect textures) by parsing the
//! binary formats that reference them. It resolves each file through a
//! stack of archive sources where a patch layer can override a base layer.
//! The discovered files form a checkable tree, and the selected subset can
//! be exported to a directory or to caller-supplied writers.
//!
//! # Examples
//!
//! ```no_run
//! use mapx_core::CancellationToken;
//! use mapx_core::Document;
//! use mapx_core::NoopProgress;
//! use mapx_core::source::open_source;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Path::new("/games/ro/data.zip");
//! let doc = Document::new(open_source(archive)?, archive);
//! doc.load_source_list("/games/ro/patch,<primary>:data.zip");
//!
//! doc.walk("data\\prontera.rsw", &CancellationToken::new())?;
//! let report = doc.export_to(&doc.default_export_dir(), &mut NoopProgress)?;
//! println!("Exported {} files", report.files_written);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod formats;
pub mod path;
pub mod resolver;
pub mod selection;
pub mod source;
pub mod tree;
pub mod walker;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use config::ExportConfig;
pub use config::SourceList;
pub use config::WalkConfig;
pub use document::CancellationToken;
pub use document::Document;
pub use document::WalkSummary;
pub use error::MapError;
pub use error::ParseError;
pub use error::Result;
pub use export::ExportReport;
pub use export::Exporter;
pub use export::NoopProgress;
pub use export::Progress;
pub use export::ProgressCallback;
pub use formats::ExtractorSet;
pub use formats::ReferenceExtractor;
pub use formats::ResourceKind;
pub use resolver::Generation;
pub use resolver::LayeredResolver;
pub use resolver::ResolverBuilder;
pub use selection::SelectionSet;
pub use source::ArchiveSource;
pub use tree::CheckState;
pub use tree::DependencyTree;
pub use tree::NodeId;
pub use walker::Walker;
