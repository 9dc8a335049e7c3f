//! Progress bar implementation for exports.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use mapx_core::Progress;
use mapx_core::ProgressCallback;
use std::fmt::Write;
use std::time::Duration;

/// CLI progress bar wrapper implementing `ProgressCallback`.
///
/// Spins while the export prepares its directories, then shows the file
/// count and the file being copied. Cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates a new CLI progress bar.
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    fn switch_to_bar(&self, total: usize) {
        // Template: "[████████░░░░] 42/100 files (12s) data\texture\wall.bmp"
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}", humanize_duration(state.eta())).unwrap_or(());
                })
                .progress_chars("█▓░"),
        );
        self.bar.set_length(total as u64);
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_progress(&mut self, progress: Progress) {
        if progress == Progress::Indeterminate {
            self.bar.tick();
        }
    }

    fn on_file_start(&mut self, path: &str, total: usize, current: usize) {
        if current == 1 {
            self.switch_to_bar(total);
        }
        self.bar.set_message(path.to_string());
    }

    fn on_file_complete(&mut self, _path: &str, _bytes: u64) {
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Converts duration to human-readable format.
fn humanize_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
