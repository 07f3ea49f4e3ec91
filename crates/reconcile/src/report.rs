//! The reconciliation report handed to presentation and export

use crate::diff::DiffReport;
use crate::types::{ResourceAssociations, RowWarning};
use serde::Serialize;

/// Diff results plus the associations and skipped rows they came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    diff: DiffReport,
    key_to_resource_associations: ResourceAssociations,
    skipped_rows: Vec<RowWarning>,
}

impl Report {
    pub fn new(
        diff: DiffReport,
        associations: ResourceAssociations,
        skipped_rows: Vec<RowWarning>,
    ) -> Self {
        Self {
            diff,
            key_to_resource_associations: associations,
            skipped_rows,
        }
    }

    pub fn diff(&self) -> &DiffReport {
        &self.diff
    }

    pub fn associations(&self) -> &ResourceAssociations {
        &self.key_to_resource_associations
    }

    pub fn skipped_rows(&self) -> &[RowWarning] {
        &self.skipped_rows
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
