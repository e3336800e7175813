//! Progress reporting for comparison runs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner-per-step progress reporter
#[derive(Debug)]
pub struct ProgressReporter {
    step_pb: Option<ProgressBar>,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for an interactive comparison
    pub fn new_for_comparison() -> Self {
        Self {
            step_pb: None,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            step_pb: None,
            show_progress: false,
        }
    }

    /// Start a pipeline step, finishing any step still running
    pub fn start_step(&mut self, message: &str) {
        self.finish_and_clear();
        if self.show_progress {
            self.step_pb = Some(create_spinner(message));
        }
        log::debug!("Step started: {}", message);
    }

    /// Finish the current step with a closing message
    pub fn finish_step(&mut self, message: &str) {
        if let Some(pb) = self.step_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.step_pb.is_some()
    }

    fn finish_and_clear(&mut self) {
        if let Some(pb) = self.step_pb.take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new_minimal()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish_and_clear();
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
