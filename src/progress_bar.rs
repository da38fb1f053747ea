//! Terminal progress bar fed by transfer snapshots.

use clipfetch_core::transfer::{ProgressSink, ProgressSnapshot};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner} [{bar:40}] {bytes}/{total_bytes} ({msg}) {bytes_per_sec}";

/// Progress bar that tracks the declared total and received bytes.
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Draws on stderr.
    pub(crate) fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_progress(&mut self, snapshot: ProgressSnapshot) {
        if self.bar.length() != Some(snapshot.declared_total_bytes) {
            self.bar.set_length(snapshot.declared_total_bytes);
        }
        self.bar.set_position(snapshot.received_bytes);
        self.bar.set_message(format!("{:.1}%", snapshot.percentage));
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Progress bar only makes sense on an interactive stderr.
pub(crate) fn should_draw(stderr_is_terminal: bool, quiet: bool, no_progress: bool) -> bool {
    stderr_is_terminal && !quiet && !no_progress
}
