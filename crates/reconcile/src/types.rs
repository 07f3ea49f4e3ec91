//! Core types for tag extraction and reconciliation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One row of a resource export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRecord {
    /// 1-based line in the export (0 when not read from a file)
    pub line: usize,
    /// Resource identifier, e.g. a VPC id
    pub resource_id: Option<String>,
    /// Raw tags cell
    pub tags: Option<String>,
    /// Address block of the resource, when the export carries one
    pub cidr: Option<String>,
    /// Every cell of the row as read, re-encoded as one CSV line
    pub raw: Option<String>,
}

impl ResourceRecord {
    /// Create a record from an id and a raw tags cell
    pub fn new(resource_id: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            line: 0,
            resource_id: Some(resource_id.into()),
            tags: Some(tags.into()),
            cidr: None,
            raw: None,
        }
    }

    /// Set the address block
    #[must_use]
    pub fn with_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr = Some(cidr.into());
        self
    }

    /// Set the line number
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// The raw row when known, otherwise id, tags and address block
impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        write!(
            f,
            "{},{}",
            self.resource_id.as_deref().unwrap_or(""),
            self.tags.as_deref().unwrap_or("")
        )?;
        if let Some(cidr) = &self.cidr {
            write!(f, ",{}", cidr)?;
        }
        Ok(())
    }
}

/// A single key/value tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Tag key to the set of resources carrying it
///
/// Inserting the same pair twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAssociations(BTreeMap<String, BTreeSet<String>>);

impl ResourceAssociations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `resource_id` carries `key`
    ///
    /// Returns `false` when the pair was already known.
    pub fn insert(&mut self, key: impl Into<String>, resource_id: impl Into<String>) -> bool {
        self.0
            .entry(key.into())
            .or_default()
            .insert(resource_id.into())
    }

    /// Resources carrying `key`
    pub fn resources(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.0.get(key)
    }

    /// All keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A row that was skipped during extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    /// 1-based line in the export (0 when unknown)
    pub line: usize,
    /// The raw row
    pub row: String,
    /// Why it was skipped
    pub reason: String,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}: {} ({})", self.line, self.reason, self.row)
        } else {
            write!(f, "{} ({})", self.reason, self.row)
        }
    }
}

/// Result of extracting tags from an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Tag key to resource ids
    pub associations: ResourceAssociations,
    /// Every distinct tag key
    pub all_keys: BTreeSet<String>,
    /// Rows skipped as malformed
    pub warnings: Vec<RowWarning>,
}
