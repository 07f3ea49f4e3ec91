//! Terminal implementations of the reconcile callbacks
//!
//! [`BarProgress`] draws an indicatif bar per batch, [`PromptConfirm`] asks
//! through dialoguer unless `--yes` was given.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{BatchReport, ConfirmCallback, MutationResult, Operation, ProgressCallback};

const BAR_TEMPLATE: &str = "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Spinner shown while waiting on the appliance
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

/// Progress bar over one batch; failures are printed above the bar
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, operation: Operation, count: usize) {
        if self.quiet || count == 0 {
            return;
        }
        let pb = ProgressBar::new(count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_prefix(operation.to_string());
        self.bar = Some(pb);
    }

    fn on_item_start(&mut self, key: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(key.to_string());
        }
    }

    fn on_item_complete(&mut self, key: &str, result: &MutationResult) {
        let Some(pb) = &self.bar else {
            return;
        };
        if result.is_failure() {
            pb.suspend(|| {
                eprintln!("  {} {}: {}", "✗".red(), key, result);
            });
        }
        pb.inc(1);
    }

    fn on_batch_complete(&mut self, _report: &BatchReport) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Confirmation through a terminal prompt
pub struct PromptConfirm {
    assume_yes: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            log::info!("Auto-confirmed: {prompt}");
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }
}
