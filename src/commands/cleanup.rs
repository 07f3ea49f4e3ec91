//! Bulk deletion from a target file
//!
//! ```toml
//! attributes = ["createdby", "tfc_created"]
//!
//! [[networks]]
//! cidr = "13.212.224.0/23"
//! view = "default"   # optional, defaults to the session's view
//! ```

use anyhow::{Context as _, Result};
use reconcile::DeleteTarget;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::Context;
use crate::commands::delete_batch;
use crate::session::Session;
use crate::ui;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CleanupFile {
    #[serde(default)]
    attributes: Vec<String>,
    #[serde(default)]
    networks: Vec<NetworkEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkEntry {
    cidr: String,
    view: Option<String>,
}

impl CleanupFile {
    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid cleanup file {}", path.display()))
    }

    /// Attributes first, then networks, in file order
    fn targets(self) -> Vec<DeleteTarget> {
        let attributes = self.attributes.into_iter().map(DeleteTarget::attribute);
        let networks = self
            .networks
            .into_iter()
            .map(|n| DeleteTarget::network(n.cidr, n.view.as_deref()));
        attributes.chain(networks).collect()
    }
}

pub fn run(ctx: &Context, session: &Session, file: &Path) -> Result<()> {
    let targets = CleanupFile::load(file)?.targets();
    if targets.is_empty() {
        ui::info(&format!("{} lists nothing to delete", file.display()));
        return Ok(());
    }

    ui::header(&format!("Cleanup ({} targets)", targets.len()));
    for target in &targets {
        ui::dim(&target.to_string());
    }
    delete_batch(ctx, session, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_targets_in_order() {
        let file: CleanupFile = toml::from_str(
            r#"
attributes = ["owner", "createdby"]

[[networks]]
cidr = "13.212.224.0/23"

[[networks]]
cidr = "13.216.140.0/23"
view = "prod"
"#,
        )
        .unwrap();

        let targets = file.targets();
        assert_eq!(
            targets,
            vec![
                DeleteTarget::attribute("owner"),
                DeleteTarget::attribute("createdby"),
                DeleteTarget::network("13.212.224.0/23", None),
                DeleteTarget::network("13.216.140.0/23", Some("prod")),
            ]
        );
    }

    #[test]
    fn test_sections_are_optional() {
        let file: CleanupFile = toml::from_str("attributes = [\"env\"]").unwrap();
        assert_eq!(file.targets().len(), 1);

        let file: CleanupFile = toml::from_str("").unwrap();
        assert!(file.targets().is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<CleanupFile>("attribute = [\"typo\"]").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleanup.toml");
        fs::write(&path, "[[networks]]\nview = \"prod\"\n").unwrap();

        let err = CleanupFile::load(&path).unwrap_err();
        assert!(format!("{err}").contains("cleanup.toml"));
    }
}
