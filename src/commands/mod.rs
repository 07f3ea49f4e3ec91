pub mod attributes;
pub mod cleanup;
pub mod config;
pub mod menu;
pub mod networks;
pub mod provider;
pub mod views;

use anyhow::{Result, bail};
use reconcile::{ConfirmCallback, DeleteTarget, batch};

use crate::Context;
use crate::progress::{BarProgress, PromptConfirm};
use crate::session::Session;
use crate::ui;

/// Confirm once, then resolve and delete each target
pub(crate) fn delete_batch(
    ctx: &Context,
    session: &Session,
    targets: Vec<DeleteTarget>,
) -> Result<()> {
    let mut confirm = PromptConfirm::new(ctx.assume_yes);
    if !confirm.confirm(&format!("Delete {} object(s)?", targets.len()))? {
        ui::info("Nothing deleted");
        return Ok(());
    }

    let mut bar = BarProgress::new(ctx.quiet);
    let report = batch::delete_targets(session.client(), targets, &mut bar);
    ui::batch(&report);

    if !report.is_success() {
        bail!("{} deletion(s) failed", report.summary().failed);
    }
    Ok(())
}
