//! Confirmation and progress callbacks
//!
//! These traits keep the engine free of any terminal code. The CLI provides
//! interactive implementations; tests use the no-op ones below.

use crate::batch::{BatchReport, MutationResult, Operation};
use anyhow::Result;

/// Progress callback for batch mutations
pub trait ProgressCallback: Send {
    /// Called before the first item of a batch
    fn on_batch_start(&mut self, operation: Operation, count: usize);

    /// Called before a remote call for one item
    fn on_item_start(&mut self, key: &str);

    /// Called with the outcome of one item
    fn on_item_complete(&mut self, key: &str, result: &MutationResult);

    /// Called once the batch is done (or was stopped)
    fn on_batch_complete(&mut self, report: &BatchReport);

    /// Checked between items; returning `false` stops the batch and
    /// marks the remaining items as skipped
    fn should_continue(&self) -> bool {
        true
    }
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _operation: Operation, _count: usize) {}
    fn on_item_start(&mut self, _key: &str) {}
    fn on_item_complete(&mut self, _key: &str, _result: &MutationResult) {}
    fn on_batch_complete(&mut self, _report: &BatchReport) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
