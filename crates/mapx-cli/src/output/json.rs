//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::TreeView;
use anyhow::Result;
use mapx_core::ExportReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct FailureOutput<'a> {
    path: &'a str,
    reason: &'a str,
}

#[derive(Serialize)]
struct ExportOutput<'a> {
    destination: String,
    files_written: usize,
    bytes_written: u64,
    directories_created: usize,
    duplicates_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    open_target: Option<String>,
    failures: Vec<FailureOutput<'a>>,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format_tree(&self, view: &TreeView) -> Result<()> {
        Self::output(&JsonOutput::success("tree", view))
    }

    fn format_export_result(&self, dest: &Path, report: &ExportReport) -> Result<()> {
        let data = ExportOutput {
            destination: dest.display().to_string(),
            files_written: report.files_written,
            bytes_written: report.bytes_written,
            directories_created: report.directories_created,
            duplicates_skipped: report.duplicates_skipped,
            open_target: report.open_target.as_ref().map(|p| p.display().to_string()),
            failures: report
                .failures
                .iter()
                .map(|f| FailureOutput {
                    path: &f.path,
                    reason: &f.reason,
                })
                .collect(),
            duration_ms: report.duration.as_millis(),
        };

        let output = if report.is_complete() {
            JsonOutput::success("export", data)
        } else {
            JsonOutput::partial("export", data)
        };
        Self::output(&output)
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}
