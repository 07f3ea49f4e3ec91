//! Cloud provider capabilities
//!
//! A [`Provider`] knows how to search its inventory, audit it against the
//! appliance, and push it to the appliance. Callers only depend on the
//! trait; [`AwsProvider`] reads an AWS VPC export.

use crate::batch::{self, BatchReport, NetworkPlan};
use crate::context::{ConfirmCallback, ProgressCallback};
use crate::error::{Error, Result};
use crate::extract::parse_tags;
use crate::orchestrator::Reconciler;
use crate::report::Report;
use crate::source::{ExportSource, Row};
use crate::types::{RowWarning, Tag};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use wapi::{Client, ObjectRef};

/// Inventory capabilities of a cloud provider
pub trait Provider {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Create appliance networks for inventory resources that lack one
    fn sync(
        &self,
        client: &Client,
        confirm: &mut dyn ConfirmCallback,
        progress: &mut dyn ProgressCallback,
    ) -> Result<SyncReport>;

    /// Find resources matching a query
    fn search(&self, query: &SearchQuery) -> Result<SearchReport>;

    /// Compare inventory resources with the appliance (read-only)
    fn audit(&self, client: &Client) -> Result<AuditReport>;
}

/// Search term
#[derive(Debug, Clone)]
pub enum SearchQuery {
    /// Case-insensitive substring
    Text(String),
    /// Case-insensitive regular expression
    Pattern(Regex),
}

impl SearchQuery {
    pub fn text(term: impl Into<String>) -> Self {
        Self::Text(term.into().to_lowercase())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self::Pattern(regex))
    }

    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            Self::Text(term) => haystack.to_lowercase().contains(term.as_str()),
            Self::Pattern(regex) => regex.is_match(haystack),
        }
    }
}

/// Part of a resource that matched a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum MatchedField {
    ResourceId,
    Cidr,
    TagKey { key: String },
    TagValue { key: String, value: String },
}

impl fmt::Display for MatchedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceId => f.write_str("id"),
            Self::Cidr => f.write_str("cidr"),
            Self::TagKey { key } => write!(f, "tag {}", key),
            Self::TagValue { key, value } => write!(f, "{}={}", key, value),
        }
    }
}

/// One resource matching a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub line: usize,
    pub resource_id: String,
    pub cidr: Option<String>,
    pub matched: Vec<MatchedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub hits: Vec<SearchHit>,
    pub skipped_rows: Vec<RowWarning>,
}

/// Appliance status of a resource's network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NetworkStatus {
    Present { reference: ObjectRef },
    Absent,
    Unknown { message: String },
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { .. } => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Unknown { message } => write!(f, "unknown ({})", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub resource_id: String,
    pub cidr: String,
    pub network: NetworkStatus,
    /// Tag keys with no attribute definition on the appliance
    pub undefined_keys: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
    /// Resources skipped because the export has no address block for them
    pub without_cidr: usize,
    pub skipped_rows: Vec<RowWarning>,
}

impl AuditReport {
    pub fn absent(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.network, NetworkStatus::Absent))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub analysis: Report,
    /// `None` when the user declined to continue
    pub networks: Option<BatchReport>,
}

/// Resource with parsed tags
struct Resource {
    line: usize,
    id: String,
    cidr: Option<String>,
    tags: Vec<Tag>,
}

/// Provider backed by an AWS VPC export
pub struct AwsProvider {
    source: ExportSource,
}

impl AwsProvider {
    pub fn new(source: ExportSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &ExportSource {
        &self.source
    }

    /// Rows with an id and parseable tags; everything else is a warning
    fn resources(rows: &[Row]) -> (Vec<Resource>, Vec<RowWarning>) {
        let mut resources = Vec::new();
        let mut warnings = Vec::new();
        for row in rows {
            let record = match row {
                Ok(record) => record,
                Err(warning) => {
                    warnings.push(warning.clone());
                    continue;
                }
            };
            let Some(id) = record.resource_id.clone() else {
                continue;
            };
            match parse_tags(record.tags.as_deref()) {
                Ok(tags) => resources.push(Resource {
                    line: record.line,
                    id,
                    cidr: record.cidr.clone(),
                    tags: tags.unwrap_or_default(),
                }),
                Err(reason) => {
                    log::warn!("skipping line {}: {}", record.line, reason);
                    warnings.push(RowWarning {
                        line: record.line,
                        row: record.to_string(),
                        reason,
                    });
                }
            }
        }
        (resources, warnings)
    }
}

impl Provider for AwsProvider {
    fn name(&self) -> &str {
        "AWS"
    }

    fn sync(
        &self,
        client: &Client,
        confirm: &mut dyn ConfirmCallback,
        progress: &mut dyn ProgressCallback,
    ) -> Result<SyncReport> {
        let rows = self.source.rows()?;
        let mut run = Reconciler::new(client);
        let analysis = run.analyze_rows(rows.iter().cloned())?;

        let missing = analysis.diff().missing_in_remote();
        if !missing.is_empty() {
            let prompt = format!(
                "{} tag key(s) have no attribute definition and will not be synced. Continue?",
                missing.len()
            );
            if !confirm.confirm(&prompt).map_err(Error::Callback)? {
                return Ok(SyncReport {
                    analysis,
                    networks: None,
                });
            }
        }

        let defined = analysis.diff().all_remote_names();
        let (resources, _) = Self::resources(&rows);
        let plans: Vec<NetworkPlan> = resources
            .into_iter()
            .filter_map(|resource| {
                let cidr = resource.cidr?;
                let extattrs: BTreeMap<String, String> = resource
                    .tags
                    .into_iter()
                    .filter(|t| defined.contains(&t.key))
                    .filter_map(|t| t.value.map(|v| (t.key, v)))
                    .collect();
                Some(NetworkPlan {
                    cidr,
                    comment: resource.id,
                    extattrs,
                })
            })
            .collect();

        log::info!("syncing {} network(s) from {}", plans.len(), self.name());
        let networks = batch::create_networks(client, plans, progress);
        Ok(SyncReport {
            analysis,
            networks: Some(networks),
        })
    }

    fn search(&self, query: &SearchQuery) -> Result<SearchReport> {
        let rows = self.source.rows()?;
        let (resources, skipped_rows) = Self::resources(&rows);

        let mut hits = Vec::new();
        for resource in resources {
            let mut matched = Vec::new();
            if query.matches(&resource.id) {
                matched.push(MatchedField::ResourceId);
            }
            if resource.cidr.as_deref().is_some_and(|c| query.matches(c)) {
                matched.push(MatchedField::Cidr);
            }
            for tag in &resource.tags {
                if query.matches(&tag.key) {
                    matched.push(MatchedField::TagKey {
                        key: tag.key.clone(),
                    });
                }
                if let Some(value) = &tag.value
                    && query.matches(value)
                {
                    matched.push(MatchedField::TagValue {
                        key: tag.key.clone(),
                        value: value.clone(),
                    });
                }
            }
            if !matched.is_empty() {
                hits.push(SearchHit {
                    line: resource.line,
                    resource_id: resource.id,
                    cidr: resource.cidr,
                    matched,
                });
            }
        }

        Ok(SearchReport { hits, skipped_rows })
    }

    fn audit(&self, client: &Client) -> Result<AuditReport> {
        let rows = self.source.rows()?;
        let (resources, skipped_rows) = Self::resources(&rows);

        let defined: BTreeSet<String> = client
            .attribute_definitions()
            .map_err(Error::Fetch)?
            .into_iter()
            .map(|d| d.name)
            .collect();

        let mut report = AuditReport {
            skipped_rows,
            ..Default::default()
        };
        for resource in resources {
            let Some(cidr) = resource.cidr else {
                report.without_cidr += 1;
                continue;
            };
            let network = match client.resolve_network(&cidr, None) {
                Ok(Some(reference)) => NetworkStatus::Present { reference },
                Ok(None) => NetworkStatus::Absent,
                Err(e) => NetworkStatus::Unknown {
                    message: e.to_string(),
                },
            };
            let undefined_keys = resource
                .tags
                .into_iter()
                .map(|t| t.key)
                .filter(|k| !defined.contains(k))
                .collect();
            report.entries.push(AuditEntry {
                resource_id: resource.id,
                cidr,
                network,
                undefined_keys,
            });
        }
        Ok(report)
    }
}
