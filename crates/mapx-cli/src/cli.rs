//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mapx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resources a map file depends on
    Tree(TreeArgs),
    /// Copy a map file and its dependencies to a directory
    Export(ExportArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

/// Where resources are looked up.
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Primary archive the map file is opened from (directory, zip, tar, tar.gz)
    #[arg(short, long, value_name = "PATH")]
    pub archive: PathBuf,

    /// Additional source, searched before the archive (repeat in priority order)
    #[arg(short, long = "source", value_name = "PATH", conflicts_with = "sources")]
    pub source: Vec<PathBuf>,

    /// Persisted source list: comma-separated, highest priority first, with
    /// `<primary>:NAME` marking the archive's position
    #[arg(long, value_name = "LIST")]
    pub sources: Option<String>,

    /// Maximum nesting depth below a root
    #[arg(long, default_value = "32", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_depth: u16,
}

#[derive(clap::Args)]
pub struct TreeArgs {
    /// Map resource to inspect, as a path inside the sources (e.g. data\prontera.rsw)
    #[arg(value_name = "FILE")]
    pub file: String,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Only list resources that would be exported
    #[arg(long)]
    pub selected: bool,
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Map resource to export, as a path inside the sources
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Output directory (default: the archive's directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Export only the map files and their direct leaf references
    #[arg(long)]
    pub root_files_only: bool,

    /// Resource path to leave out, wherever it occurs (can be repeated)
    #[arg(long = "exclude", short = 'x', value_name = "PATH")]
    pub exclude: Vec<String>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sources_conflict() {
        let result = Cli::try_parse_from([
            "mapx",
            "tree",
            "data\\a.gnd",
            "--archive",
            "data.zip",
            "--source",
            "patch",
            "--sources",
            "patch,<primary>:data.zip",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_args() {
        let Ok(cli) = Cli::try_parse_from([
            "mapx",
            "export",
            "data\\a.rsw",
            "out",
            "-a",
            "data.zip",
            "-s",
            "patch",
            "-s",
            "extra",
            "-x",
            "data\\texture\\sky.bmp",
            "--root-files-only",
        ]) else {
            panic!("export arguments should parse");
        };
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.sources.source.len(), 2);
        assert_eq!(args.exclude, ["data\\texture\\sky.bmp"]);
        assert!(args.root_files_only);
        assert_eq!(args.sources.max_depth, 32);
    }
}
