use anyhow::Result;
use chrono::Local;
use reconcile::{CreateOptions, DeleteTarget, Reconciler, Report};
use std::path::PathBuf;
use wapi::{AttributeType, NewAttributeDefinition};

use crate::Context;
use crate::cli::AttributesCommand;
use crate::commands::delete_batch;
use crate::export;
use crate::paths;
use crate::progress::{self, BarProgress, PromptConfirm};
use crate::session::Session;
use crate::ui;

pub fn run(ctx: &Context, session: &Session, cmd: AttributesCommand) -> Result<()> {
    match cmd {
        AttributesCommand::List => list(ctx, session),
        AttributesCommand::ListMissing => list_missing(ctx, session),
        AttributesCommand::Analyze { json } => analyze(ctx, session, json),
        AttributesCommand::CreateMissing {
            attribute_type,
            comment,
        } => create_missing(ctx, session, attribute_type, comment),
        AttributesCommand::Export { output } => export(ctx, session, output),
        AttributesCommand::Delete { names } => delete(ctx, session, names),
    }
}

pub fn list(ctx: &Context, session: &Session) -> Result<()> {
    let pb = (!ctx.quiet).then(|| progress::spinner("Fetching attribute definitions..."));
    let result = session.client().attribute_definitions();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut definitions = result?;
    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    ui::definitions(&definitions);
    Ok(())
}

/// Extract, fetch and diff with a spinner
fn analysis(ctx: &Context, session: &Session) -> Result<Report> {
    let source = session.export_source()?;
    let pb = (!ctx.quiet).then(|| progress::spinner("Analyzing tags..."));
    let result = Reconciler::new(session.client()).analyze(&source);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

pub fn list_missing(ctx: &Context, session: &Session) -> Result<()> {
    let report = analysis(ctx, session)?;
    ui::missing(&report);
    ui::skipped(report.skipped_rows());
    Ok(())
}

pub fn analyze(ctx: &Context, session: &Session, json: bool) -> Result<()> {
    let report = analysis(ctx, session)?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        ui::analysis(&report);
    }
    Ok(())
}

pub fn create_missing(
    ctx: &Context,
    session: &Session,
    attribute_type: AttributeType,
    comment: Option<String>,
) -> Result<()> {
    let source = session.export_source()?;
    let mut run = Reconciler::new(session.client());
    let report = run.analyze(&source)?;
    ui::missing(&report);

    let options = CreateOptions {
        attribute_type,
        comment: comment.unwrap_or_else(|| NewAttributeDefinition::DEFAULT_COMMENT.to_string()),
    };
    let mut confirm = PromptConfirm::new(ctx.assume_yes);
    let mut bar = BarProgress::new(ctx.quiet);

    match run.create_missing(&options, &mut confirm, &mut bar)? {
        Some(batch) if batch.outcomes.is_empty() => Ok(()),
        Some(batch) => {
            ui::batch(&batch);
            if batch.is_success() {
                Ok(())
            } else {
                anyhow::bail!("{} definition(s) could not be created", batch.summary().failed)
            }
        }
        None => {
            ui::info("Nothing created");
            Ok(())
        }
    }
}

pub fn export(ctx: &Context, session: &Session, output: Option<String>) -> Result<()> {
    let report = analysis(ctx, session)?;
    let base = output
        .map(|o| paths::expand(o.trim()))
        .unwrap_or_else(|| PathBuf::from(export::default_base_name(Local::now())));

    let written = export::write(&report, &base)?;
    ui::success(&format!(
        "Analysis exported to {} and {}",
        written.json.display(),
        written.csv.display()
    ));
    Ok(())
}

pub fn delete(ctx: &Context, session: &Session, names: Vec<String>) -> Result<()> {
    let targets = names.into_iter().map(DeleteTarget::attribute).collect();
    delete_batch(ctx, session, targets)
}
