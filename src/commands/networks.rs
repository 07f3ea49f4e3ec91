use anyhow::Result;
use reconcile::DeleteTarget;

use crate::Context;
use crate::cli::NetworksCommand;
use crate::commands::delete_batch;
use crate::progress;
use crate::session::Session;
use crate::ui;

pub fn run(ctx: &Context, session: &Session, cmd: NetworksCommand) -> Result<()> {
    match cmd {
        NetworksCommand::List { network } => list(ctx, session, network.as_deref()),
        NetworksCommand::Delete { cidrs } => delete(ctx, session, cidrs),
    }
}

pub fn list(ctx: &Context, session: &Session, network: Option<&str>) -> Result<()> {
    let pb = (!ctx.quiet).then(|| progress::spinner("Fetching networks..."));
    let result = session.client().networks(network);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let networks = result?;
    if networks.is_empty() {
        ui::info(&format!(
            "No networks in view {}",
            session.client().view()
        ));
        return Ok(());
    }
    ui::networks(&networks);
    Ok(())
}

/// Delete networks in the session's view
pub fn delete(ctx: &Context, session: &Session, cidrs: Vec<String>) -> Result<()> {
    let view = session.client().view().as_param().map(str::to_string);
    let targets = cidrs
        .into_iter()
        .map(|cidr| DeleteTarget::network(cidr, view.as_deref()))
        .collect();
    delete_batch(ctx, session, targets)
}
