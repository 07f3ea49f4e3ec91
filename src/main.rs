mod cli;
mod commands;
mod config;
mod export;
mod paths;
mod progress;
mod session;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use session::{Overrides, Session};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Answer yes to every confirmation
    pub assume_yes: bool,
    pub config_path: PathBuf,
    pub overrides: Overrides,
}

/// Log sink writing to stderr and a file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None);

    if let Some(path) = &cli.log_file {
        let file = open_log_file(path)?;
        builder
            .format_timestamp_secs()
            .write_style(env_logger::WriteStyle::Never)
            .target(env_logger::Target::Pipe(Box::new(Tee { file })));
    }

    builder.init();
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli) {
        ui::error(&format!("{err:#}"));
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print the error chain plus advice for appliance errors
fn report_error(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    let remote = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<wapi::Error>()
            .or_else(|| cause.downcast_ref::<reconcile::Error>()?.remote())
    });
    if let Some(remote) = remote {
        ui::dim(&format!(
            "{}: {}",
            remote.category().description(),
            remote.category().advice()
        ));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => paths::config_file()?,
    };

    let ctx = Context {
        quiet: cli.quiet,
        assume_yes: cli.yes,
        config_path,
        overrides: Overrides {
            host: cli.host,
            user: cli.user,
            password: cli.password,
            network_view: cli.network_view,
            export: cli.export,
        },
    };
    log::debug!("Using config file {}", ctx.config_path.display());

    let command = cli.command.unwrap_or(Command::Menu);
    match command {
        Command::Config(cmd) => return commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ddictl", &mut io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut session = Session::open(&ctx, matches!(command, Command::Menu))?;
    match command {
        Command::Attributes(cmd) => commands::attributes::run(&ctx, &session, cmd),
        Command::Networks(cmd) => commands::networks::run(&ctx, &session, cmd),
        Command::Views => commands::views::run(&ctx, &session),
        Command::Cleanup { file } => commands::cleanup::run(&ctx, &session, &file),
        Command::Sync => commands::provider::sync(&ctx, &session),
        Command::Search { term, regex } => {
            commands::provider::search(&ctx, &session, &term, regex)
        }
        Command::Audit => commands::provider::audit(&ctx, &session),
        Command::Menu => commands::menu::run(&ctx, &mut session),
        // Handled before connecting
        Command::Config(_) | Command::Completions { .. } => Ok(()),
    }
}
