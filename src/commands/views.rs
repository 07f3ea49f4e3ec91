use anyhow::Result;

use crate::Context;
use crate::progress;
use crate::session::Session;
use crate::ui;

pub fn run(ctx: &Context, session: &Session) -> Result<()> {
    let pb = (!ctx.quiet).then(|| progress::spinner("Fetching network views..."));
    let result = session.client().network_views();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut views = result?;
    views.sort_by(|a, b| a.name.cmp(&b.name));
    ui::views(&views);
    ui::kv("Current view", &session.client().view().to_string());
    Ok(())
}
