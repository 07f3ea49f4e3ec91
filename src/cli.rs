use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use wapi::AttributeType;

#[derive(Parser)]
#[command(name = "ddictl")]
#[command(author = "DDI Tools")]
#[command(version)]
#[command(
    about = "Reconcile cloud resource tags with Infoblox extensible attributes",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/ddictl/config.toml)
    #[arg(long, env = "DDICTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Network view to operate in ("All" for every view)
    #[arg(long, global = true)]
    pub network_view: Option<String>,

    /// Grid master host name or address
    #[arg(long, env = "DDICTL_HOST", global = true)]
    pub host: Option<String>,

    /// Admin user name
    #[arg(long, env = "DDICTL_USER", global = true)]
    pub user: Option<String>,

    /// Admin password (environment only)
    #[arg(long, env = "DDICTL_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// AWS VPC export (CSV)
    #[arg(long, global = true)]
    pub export: Option<PathBuf>,

    /// Also write log output to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Command to run (interactive menu when omitted)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extensible attribute definitions vs. AWS tags
    #[command(subcommand)]
    Attributes(AttributesCommand),

    /// Networks on the appliance
    #[command(subcommand)]
    Networks(NetworksCommand),

    /// List network views
    Views,

    /// Delete the attributes and networks listed in a TOML file
    Cleanup {
        /// Cleanup file
        file: PathBuf,
    },

    /// Create appliance networks for exported VPCs
    Sync,

    /// Search the export by id, CIDR, tag key or tag value
    Search {
        /// Search term
        term: String,

        /// Treat the term as a regular expression
        #[arg(long)]
        regex: bool,
    },

    /// Compare exported VPCs with appliance networks (read-only)
    Audit,

    /// Interactive menu
    Menu,

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Attributes Commands
// ============================================================================

#[derive(Subcommand)]
pub enum AttributesCommand {
    /// List attribute definitions on the appliance
    List,

    /// List tag keys with no attribute definition
    ListMissing,

    /// Full analysis: missing keys, similar names and tag usage
    Analyze {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create definitions for every missing tag key
    CreateMissing {
        /// Attribute type (STRING, INTEGER, EMAIL, URL, DATE, ENUM)
        #[arg(long = "type", default_value = "STRING")]
        attribute_type: AttributeType,

        /// Comment for the new definitions
        #[arg(long)]
        comment: Option<String>,
    },

    /// Write the analysis to <base>.json and <base>.csv
    Export {
        /// Base file name (default: extended-attributes_<timestamp>)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete attribute definitions by name
    Delete {
        /// Definition names
        #[arg(required = true)]
        names: Vec<String>,
    },
}

// ============================================================================
// Networks Commands
// ============================================================================

#[derive(Subcommand)]
pub enum NetworksCommand {
    /// List networks in the current view
    List {
        /// Only this CIDR
        #[arg(long)]
        network: Option<String>,
    },

    /// Delete networks by CIDR
    Delete {
        /// CIDRs, e.g. 10.0.0.0/16
        #[arg(required = true)]
        cidrs: Vec<String>,
    },
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration (password masked)
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["ddictl"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ddictl",
            "attributes",
            "analyze",
            "--json",
            "--network-view",
            "prod",
            "-vv",
            "--yes",
        ])
        .unwrap();
        assert_eq!(cli.network_view.as_deref(), Some("prod"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.yes);
        assert!(matches!(
            cli.command,
            Some(Command::Attributes(AttributesCommand::Analyze { json: true }))
        ));
    }

    #[test]
    fn test_create_missing_type() {
        let cli =
            Cli::try_parse_from(["ddictl", "attributes", "create-missing", "--type", "integer"])
                .unwrap();
        match cli.command {
            Some(Command::Attributes(AttributesCommand::CreateMissing {
                attribute_type,
                comment,
            })) => {
                assert_eq!(attribute_type, AttributeType::Integer);
                assert!(comment.is_none());
            }
            _ => panic!("expected create-missing"),
        }
    }

    #[test]
    fn test_create_missing_rejects_unknown_type() {
        assert!(
            Cli::try_parse_from(["ddictl", "attributes", "create-missing", "--type", "blob"])
                .is_err()
        );
    }

    #[test]
    fn test_delete_requires_names() {
        assert!(Cli::try_parse_from(["ddictl", "attributes", "delete"]).is_err());
        assert!(Cli::try_parse_from(["ddictl", "networks", "delete"]).is_err());
    }

    #[test]
    fn test_search_regex() {
        let cli = Cli::try_parse_from(["ddictl", "search", "^prod-", "--regex"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Search { ref term, regex: true }) if term == "^prod-"
        ));
    }
}
