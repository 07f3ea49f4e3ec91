use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

/// Values as a command would see them, flags and environment included
fn show(ctx: &Context) -> Result<()> {
    let config = Config::load(&ctx.config_path)?;
    let overrides = &ctx.overrides;
    let infoblox = &config.infoblox;

    ui::header("Configuration");
    let state = if ctx.config_path.exists() {
        ""
    } else {
        " (not found, using defaults)"
    };
    ui::kv(
        "File",
        &format!("{}{}", ctx.config_path.display(), state),
    );

    ui::section("infoblox");
    ui::kv(
        "host",
        overrides
            .host
            .as_deref()
            .or(infoblox.host())
            .unwrap_or("(not set)"),
    );
    ui::kv(
        "admin_name",
        overrides
            .user
            .as_deref()
            .or(infoblox.admin_name())
            .unwrap_or("(not set)"),
    );
    ui::kv(
        "password",
        &ui::mask(overrides.password.as_deref().or(infoblox.password())),
    );
    ui::kv("wapi_version", &infoblox.wapi_version);
    ui::kv(
        "network_view",
        overrides
            .network_view
            .as_deref()
            .unwrap_or(&infoblox.network_view),
    );
    ui::kv("verify_tls", &infoblox.verify_tls.to_string());
    ui::kv("timeout_secs", &infoblox.timeout_secs.to_string());

    ui::section("aws");
    let export = overrides
        .export
        .clone()
        .or_else(|| config.aws.export_path())
        .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string());
    ui::kv("vpc_export_file", &export);
    let columns = &config.aws.columns;
    ui::kv("id column", &columns.id);
    ui::kv("tags column", &columns.tags);
    ui::kv("cidr column", columns.cidr.as_deref().unwrap_or("(none)"));

    if !infoblox.verify_tls {
        println!();
        ui::warn("TLS certificate verification is disabled");
    }
    Ok(())
}
