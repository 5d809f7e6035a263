//! Spinner shown while the provider blocks on instance status checks.

#![allow(clippy::expect_used)] // templates are literals

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["◐", "◓", "◑", "◒"];

/// Start a spinner that also shows how long the wait has lasted.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(TICKS)
            .template("  {spinner:.cyan} {msg} {elapsed:.dim}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Replace the spinner with a checkmark line that keeps the elapsed time.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  ✓ {msg} {elapsed:.dim}")
            .expect("valid template"),
    );
    pb.finish_with_message(msg.to_string());
}

/// Remove the spinner line entirely.
pub fn abandon(pb: &ProgressBar) {
    pb.finish_and_clear();
}
