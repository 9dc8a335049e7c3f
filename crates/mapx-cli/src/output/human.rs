//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::TreeRow;
use super::formatter::TreeView;
use anyhow::Result;
use console::Term;
use console::style;
use mapx_core::ExportReport;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }

    fn marker(row: &TreeRow) -> &'static str {
        if !row.found {
            return "[-]";
        }
        match row.state {
            "checked" => "[x]",
            "partial" => "[~]",
            _ => "[ ]",
        }
    }

    fn format_row(&self, row: &TreeRow) -> String {
        let indent = "  ".repeat(row.depth);
        let marker = Self::marker(row);
        let mut line = if self.use_colors && !row.found {
            format!("{indent}{} {}", style(marker).dim(), style(&row.name).dim())
        } else {
            format!("{indent}{marker} {}", row.name)
        };

        if !row.found {
            line.push_str(" (missing)");
        }
        if let Some(note) = &row.note {
            if self.use_colors {
                line.push_str(&format!(" {}", style(format!("({note})")).yellow()));
            } else {
                line.push_str(&format!(" ({note})"));
            }
        }
        if self.verbose
            && let Some(source) = &row.source
        {
            line.push_str(&format!("  <- {source}"));
        }
        line
    }

    fn write_header(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_tree(&self, view: &TreeView) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for row in &view.rows {
            let _ = self.term.write_line(&self.format_row(row));
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} resources, {} selected, {} missing",
            Self::format_number(view.resources),
            Self::format_number(view.selected),
            Self::format_number(view.missing)
        ));

        Ok(())
    }

    fn format_export_result(&self, dest: &Path, report: &ExportReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if report.is_complete() {
            self.write_header(&format!("Export complete: {}", dest.display()));
        } else {
            self.write_header(&format!("Export finished with errors: {}", dest.display()));
        }

        let _ = self.term.write_line(&format!(
            "  Files written: {}",
            Self::format_number(report.files_written)
        ));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        if !report.failures.is_empty() {
            let _ = self
                .term
                .write_line(&format!("  Failed: {}", report.failures.len()));
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duplicates skipped: {}", report.duplicates_skipped));
            if let Some(target) = &report.open_target {
                let _ = self
                    .term
                    .write_line(&format!("  Open: {}", target.display()));
            }
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}
