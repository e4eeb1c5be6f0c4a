//! Progress reporting for pipeline stages
//!
//! Stages have no meaningful length, so each one gets a spinner built with
//! the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Template for stage spinners
pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {elapsed_precise} {msg}";

/// Create a spinner progress bar for operations without a known length
///
/// # Arguments
/// * `message` - Optional message to display with the spinner
///
/// # Returns
/// A configured spinner `ProgressBar`
#[must_use]
pub fn create_spinner(message: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);

    if let Some(msg) = message {
        pb.set_message(msg.to_string());
    }

    // Set reasonable tick rate
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}

/// Stage spinner that is a no-op when progress display is disabled
pub struct StageProgress {
    bar: Option<ProgressBar>,
}

impl StageProgress {
    /// Start a stage; `enabled` comes from the pipeline configuration
    #[must_use]
    pub fn start(enabled: bool, message: &str) -> Self {
        Self {
            bar: enabled.then(|| create_spinner(Some(message))),
        }
    }

    /// Finish the stage with a summary message
    pub fn finish(self, message: &str) {
        if let Some(bar) = &self.bar {
            finish_progress_bar(bar, Some(message));
        }
    }
}
