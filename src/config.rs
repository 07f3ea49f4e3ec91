//! Configuration file for ddictl
//!
//! ```toml
//! [infoblox]
//! host = "192.0.2.10"
//! admin_name = "admin"
//! password = "secret"
//! wapi_version = "2.13.1"
//! network_view = "All"
//! verify_tls = false
//! timeout_secs = 30
//!
//! [aws]
//! vpc_export_file = "~/exports/vpcs.csv"
//!
//! [aws.columns]
//! id = "VpcId"
//! tags = "Tags"
//! cidr = "CidrBlock"
//! ```

use anyhow::{Context, Result};
use reconcile::Columns;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Values shipped in the sample config; they count as unset
const PLACEHOLDERS: &[&str] = &[
    "YOUR_INFOBLOX_IP",
    "YOUR_INFOBLOX_USERNAME",
    "YOUR_INFOBLOX_PASSWORD",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub infoblox: InfobloxConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfobloxConfig {
    /// Grid master host name or address
    #[serde(alias = "grid_master_ip", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(alias = "username", skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub wapi_version: String,

    /// `All` or a view name
    pub network_view: String,

    pub verify_tls: bool,

    pub timeout_secs: u64,
}

impl Default for InfobloxConfig {
    fn default() -> Self {
        Self {
            host: None,
            admin_name: None,
            password: None,
            wapi_version: wapi::DEFAULT_WAPI_VERSION.to_string(),
            network_view: "All".to_string(),
            verify_tls: false,
            timeout_secs: 30,
        }
    }
}

impl InfobloxConfig {
    pub fn host(&self) -> Option<&str> {
        usable(self.host.as_deref())
    }

    pub fn admin_name(&self) -> Option<&str> {
        usable(self.admin_name.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        usable(self.password.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// CSV export of VPCs (`~` and variables are expanded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_export_file: Option<String>,

    pub columns: Columns,
}

impl AwsConfig {
    pub fn export_path(&self) -> Option<PathBuf> {
        usable(self.vpc_export_file.as_deref()).map(paths::expand)
    }
}

impl Config {
    /// Load the config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Write the config file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Trimmed value, or `None` when blank or a sample placeholder
fn usable(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !PLACEHOLDERS.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.infoblox.wapi_version, "2.13.1");
        assert_eq!(config.infoblox.network_view, "All");
        assert!(!config.infoblox.verify_tls);
        assert_eq!(config.aws.columns.id, "VpcId");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[infoblox]
host = "192.0.2.10"
admin_name = "admin"
password = "secret"
wapi_version = "2.12"
network_view = "prod"
verify_tls = true
timeout_secs = 5

[aws]
vpc_export_file = "/data/vpcs.csv"

[aws.columns]
id = "ResourceId"
tags = "TagList"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.infoblox.host(), Some("192.0.2.10"));
        assert_eq!(config.infoblox.admin_name(), Some("admin"));
        assert_eq!(config.infoblox.wapi_version, "2.12");
        assert_eq!(config.infoblox.network_view, "prod");
        assert!(config.infoblox.verify_tls);
        assert_eq!(config.infoblox.timeout_secs, 5);
        assert_eq!(
            config.aws.export_path(),
            Some(PathBuf::from("/data/vpcs.csv"))
        );
        assert_eq!(config.aws.columns.id, "ResourceId");
        // Unset column keeps its default
        assert_eq!(config.aws.columns.cidr.as_deref(), Some("CidrBlock"));
    }

    #[test]
    fn test_legacy_keys() {
        let toml = r#"
[infoblox]
grid_master_ip = "10.1.1.1"
username = "legacy"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.infoblox.host(), Some("10.1.1.1"));
        assert_eq!(config.infoblox.admin_name(), Some("legacy"));
    }

    #[test]
    fn test_placeholders_are_unset() {
        let toml = r#"
[infoblox]
host = "YOUR_INFOBLOX_IP"
admin_name = "YOUR_INFOBLOX_USERNAME"
password = "YOUR_INFOBLOX_PASSWORD"

[aws]
vpc_export_file = "   "
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.infoblox.host(), None);
        assert_eq!(config.infoblox.admin_name(), None);
        assert_eq!(config.infoblox.password(), None);
        assert_eq!(config.aws.export_path(), None);
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[infoblox\nhost = 1").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.infoblox.host = Some("grid.example.com".to_string());
        config.infoblox.admin_name = Some("admin".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("password"));
    }
}
