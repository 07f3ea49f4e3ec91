//! Path resolution for ddictl
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `XDG_CONFIG_HOME/ddictl` (if set)
//! 2. Platform default:
//!    - Windows: `%APPDATA%\ddictl`
//!    - macOS/Linux: `~/.config/ddictl`
//!
//! The config file itself can be overridden with `--config` or
//! `DDICTL_CONFIG`.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::PathBuf;

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the ddictl config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        let path = PathBuf::from(xdg_config).join("ddictl");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("ddictl"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("ddictl"))
}

/// Default location of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables leave the input untouched.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand("~/vpcs.csv"), home.join("vpcs.csv"));
    }

    #[test]
    fn test_expand_plain_path_unchanged() {
        assert_eq!(expand("/tmp/vpcs.csv"), PathBuf::from("/tmp/vpcs.csv"));
    }

    #[test]
    fn test_expand_unknown_variable_kept() {
        let path = expand("$DDICTL_SURELY_UNSET_VARIABLE/vpcs.csv");
        assert_eq!(path, PathBuf::from("$DDICTL_SURELY_UNSET_VARIABLE/vpcs.csv"));
    }

    #[test]
    fn test_config_file_name() {
        let path = config_file().unwrap();
        assert!(path.ends_with("ddictl/config.toml"));
    }
}
