//! Provider commands: sync, search and audit over the AWS VPC export

use anyhow::{Result, bail};
use reconcile::{Provider, SearchQuery};

use crate::Context;
use crate::progress::{self, BarProgress, PromptConfirm};
use crate::session::Session;
use crate::ui;

pub fn sync(ctx: &Context, session: &Session) -> Result<()> {
    let provider = session.provider()?;
    ui::header(&format!("{} sync", provider.name()));

    let mut confirm = PromptConfirm::new(ctx.assume_yes);
    let mut bar = BarProgress::new(ctx.quiet);
    let report = provider.sync(session.client(), &mut confirm, &mut bar)?;

    ui::missing(&report.analysis);
    ui::skipped(report.analysis.skipped_rows());
    let Some(networks) = report.networks else {
        ui::info("Sync cancelled");
        return Ok(());
    };
    if networks.outcomes.is_empty() {
        ui::info("No exported resource has a CIDR");
        return Ok(());
    }

    ui::batch(&networks);
    if !networks.is_success() {
        bail!("{} network(s) could not be created", networks.summary().failed);
    }
    Ok(())
}

pub fn search(_ctx: &Context, session: &Session, term: &str, regex: bool) -> Result<()> {
    let query = if regex {
        SearchQuery::regex(term)?
    } else {
        SearchQuery::text(term)
    };

    let report = session.provider()?.search(&query)?;
    if report.hits.is_empty() {
        ui::info(&format!("No resources match '{term}'"));
        ui::skipped(&report.skipped_rows);
        return Ok(());
    }
    ui::search(&report);
    Ok(())
}

pub fn audit(ctx: &Context, session: &Session) -> Result<()> {
    let provider = session.provider()?;
    let pb = (!ctx.quiet).then(|| progress::spinner("Auditing networks..."));
    let result = provider.audit(session.client());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = result?;
    ui::audit(&report);

    let absent = report.absent().count();
    if absent > 0 {
        ui::warn(&format!("{absent} network(s) missing from the appliance"));
    } else if !report.entries.is_empty() {
        ui::success("Every exported network exists on the appliance");
    }
    Ok(())
}
