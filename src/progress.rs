//! Dispatch progress indication on stderr.
//!
//! The bar is drawn only when it is worth drawing: enough files queued,
//! an interactive stderr, and not running under CI. Everywhere else the
//! tracing events remain the progress channel.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Below this many files the bar would flicker and vanish.
const MIN_FILES_FOR_BAR: usize = 10;

const BAR_TEMPLATE: &str =
    "Analyzing {bar:40} {pos:>4}/{len:4} files ({percent:>3}%) {msg}";

/// Wraps an indicatif bar that may not exist. Callers report completed
/// files unconditionally; a disabled bar swallows the updates.
pub struct DispatchProgress {
    bar: Option<ProgressBar>,
}

impl DispatchProgress {
    pub fn new(total_files: usize, is_tty: bool, is_ci: bool) -> Self {
        let enabled = total_files >= MIN_FILES_FOR_BAR && is_tty && !is_ci;
        let bar = enabled.then(|| {
            let bar = ProgressBar::new(total_files as u64);
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .expect("static progress template")
                    .progress_chars("⣿⣀ "),
            );
            bar
        });
        Self { bar }
    }

    /// Gate on the ambient environment: stderr TTY plus the `CI` variable.
    pub fn from_env(total_files: usize) -> Self {
        Self::new(
            total_files,
            std::io::stderr().is_terminal(),
            std::env::var_os("CI").is_some(),
        )
    }

    /// One file settled (analyzed, failed, or ruleless). Shows its path
    /// next to the bar.
    pub fn file_done(&self, file: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(file.to_string());
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
