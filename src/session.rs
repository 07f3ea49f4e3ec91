//! Connection setup: credentials, client and network view
//!
//! Every value resolves in the same order: command-line flag or environment
//! variable, then the config file, then an interactive prompt. Prompted
//! values can be saved back to the config file.

use anyhow::{Context as _, Result};
use dialoguer::{Confirm, Input, Password, Select};
use reconcile::{AwsProvider, ExportSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wapi::{Client, Credentials, Endpoint, View};

use crate::Context;
use crate::config::Config;
use crate::paths;
use crate::progress;
use crate::ui;

const DEFAULT_VIEW_CHOICE: &str = "Default (All)";
const FETCH_VIEW_CHOICE: &str = "Select from Infoblox";

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub network_view: Option<String>,
    pub export: Option<PathBuf>,
}

/// An open connection to the appliance plus the loaded configuration
pub struct Session {
    config: Config,
    client: Client,
    export: Option<PathBuf>,
}

impl Session {
    /// Resolve credentials, connect and pick the network view.
    ///
    /// `interactive` offers a view picker when no view was given on the
    /// command line.
    pub fn open(ctx: &Context, interactive: bool) -> Result<Self> {
        let mut config = Config::load(&ctx.config_path)?;
        let endpoint = resolve_endpoint(ctx, &mut config)?;

        let mut client =
            Client::connect(&endpoint, View::All).context("Failed to set up the WAPI client")?;

        let view = match pick(ctx.overrides.network_view.as_deref(), None) {
            Some(view) => View::from(view.as_str()),
            None if interactive => select_view(ctx, &client)?,
            None => View::from(config.infoblox.network_view.as_str()),
        };
        client.set_view(view);
        log::info!(
            "Connected to {} (network view {})",
            endpoint.host,
            client.view()
        );

        Ok(Self {
            config,
            client,
            export: ctx.overrides.export.clone(),
        })
    }

    /// Session around an existing client (used by tests)
    #[cfg(test)]
    pub fn with_client(config: Config, client: Client, export: Option<PathBuf>) -> Self {
        Self {
            config,
            client,
            export,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Pick a network view interactively and use it from now on
    pub fn change_view(&mut self, ctx: &Context) -> Result<()> {
        let view = select_view(ctx, &self.client)?;
        ui::success(&format!("Using network view {view}"));
        self.client.set_view(view);
        Ok(())
    }

    /// The AWS VPC export: `--export`, then the config file, then a prompt
    pub fn export_source(&self) -> Result<ExportSource> {
        let path = match self
            .export
            .clone()
            .or_else(|| self.config.aws.export_path())
        {
            Some(path) => path,
            None => {
                let input: String = Input::new()
                    .with_prompt("Path to the AWS VPC export file (CSV)")
                    .interact_text()
                    .context("Failed to read export path")?;
                paths::expand(input.trim())
            }
        };
        log::debug!("Using export {}", path.display());
        Ok(ExportSource::new(path).with_columns(self.config.aws.columns.clone()))
    }

    pub fn provider(&self) -> Result<AwsProvider> {
        Ok(AwsProvider::new(self.export_source()?))
    }
}

/// First non-blank value
fn pick(flag: Option<&str>, file: Option<&str>) -> Option<String> {
    flag.map(str::trim)
        .filter(|v| !v.is_empty())
        .or(file)
        .map(str::to_string)
}

fn resolve_endpoint(ctx: &Context, config: &mut Config) -> Result<Endpoint> {
    let overrides = &ctx.overrides;
    let mut changed = false;

    let host = match pick(overrides.host.as_deref(), config.infoblox.host()) {
        Some(host) => host,
        None => {
            let host: String = Input::new()
                .with_prompt("Enter Infoblox Grid Master IP")
                .interact_text()
                .context("Failed to read host")?;
            config.infoblox.host = Some(host.clone());
            changed = true;
            host
        }
    };

    let user = match pick(overrides.user.as_deref(), config.infoblox.admin_name()) {
        Some(user) => user,
        None => {
            let user: String = Input::new()
                .with_prompt("Enter Infoblox Admin Name")
                .interact_text()
                .context("Failed to read admin name")?;
            config.infoblox.admin_name = Some(user.clone());
            changed = true;
            user
        }
    };

    let password = match pick(overrides.password.as_deref(), config.infoblox.password()) {
        Some(password) => password,
        None => {
            let password = Password::new()
                .with_prompt("Enter Infoblox Password")
                .interact()
                .context("Failed to read password")?;
            config.infoblox.password = Some(password.clone());
            changed = true;
            password
        }
    };

    if changed {
        offer_save(ctx, config, &ctx.config_path)?;
    }

    let settings = &config.infoblox;
    Ok(Endpoint::new(host, Credentials::new(user, password))
        .wapi_version(settings.wapi_version.clone())
        .verify_tls(settings.verify_tls)
        .timeout(Duration::from_secs(settings.timeout_secs)))
}

fn offer_save(ctx: &Context, config: &Config, path: &Path) -> Result<()> {
    let save = ctx.assume_yes
        || Confirm::new()
            .with_prompt(format!(
                "Do you want to save these settings to {}?",
                path.display()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

    if save {
        config.save(path)?;
        ui::success(&format!("Configuration saved to {}", path.display()));
    }
    Ok(())
}

/// Ask for the view; failures to list views fall back to `All`
fn select_view(ctx: &Context, client: &Client) -> Result<View> {
    let choice = Select::new()
        .with_prompt("Select Network View?")
        .items(&[DEFAULT_VIEW_CHOICE, FETCH_VIEW_CHOICE])
        .default(0)
        .interact()
        .context("Failed to read view choice")?;
    if choice == 0 {
        return Ok(View::All);
    }

    let pb = (!ctx.quiet).then(|| progress::spinner("Fetching network views..."));
    let result = client.network_views();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut names: Vec<String> = match result {
        Ok(views) => views.into_iter().map(|v| v.name).collect(),
        Err(err) => {
            log::error!("Error fetching network views: {err}");
            ui::warn(&format!(
                "Error fetching network views: {err}. Using 'All'."
            ));
            return Ok(View::All);
        }
    };
    if names.is_empty() {
        ui::warn("No network views found. Using 'All'.");
        return Ok(View::All);
    }
    names.sort();

    let index = Select::new()
        .with_prompt("Select the Infoblox Network View")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to read network view")?;
    Ok(View::Named(names.swap_remove(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_prefers_flag() {
        assert_eq!(pick(Some("flag"), Some("file")).as_deref(), Some("flag"));
    }

    #[test]
    fn test_pick_blank_flag_falls_back() {
        assert_eq!(pick(Some("  "), Some("file")).as_deref(), Some("file"));
        assert_eq!(pick(None, Some("file")).as_deref(), Some("file"));
        assert_eq!(pick(None, None), None);
    }

    #[test]
    fn test_export_flag_overrides_config() {
        let mut config = Config::default();
        config.aws.vpc_export_file = Some("/from/config.csv".to_string());
        let client = Client::with_backend(Box::new(wapi::MockBackend::new()), View::All);

        let session = Session::with_client(
            config.clone(),
            client,
            Some(PathBuf::from("/from/flag.csv")),
        );
        assert_eq!(
            session.export_source().unwrap().path(),
            Path::new("/from/flag.csv")
        );

        let client = Client::with_backend(Box::new(wapi::MockBackend::new()), View::All);
        let session = Session::with_client(config, client, None);
        assert_eq!(
            session.export_source().unwrap().path(),
            Path::new("/from/config.csv")
        );
    }

    #[test]
    fn test_export_source_uses_configured_columns() {
        let mut config = Config::default();
        config.aws.vpc_export_file = Some("/data/vpcs.csv".to_string());
        config.aws.columns.id = "ResourceId".to_string();
        let client = Client::with_backend(Box::new(wapi::MockBackend::new()), View::All);

        let session = Session::with_client(config, client, None);
        assert_eq!(session.export_source().unwrap().columns().id, "ResourceId");
    }
}
