//! Tag extraction from resource exports

use crate::literal;
use crate::types::{Extraction, ResourceRecord, RowWarning, Tag};

/// Cell value exports use for "no tags"
pub const EMPTY_TAGS: &str = "[]";

/// Parse a raw tags cell.
///
/// Returns `Ok(None)` for an absent, blank or `[]` cell. Entries with an
/// empty key are dropped.
pub fn parse_tags(cell: Option<&str>) -> Result<Option<Vec<Tag>>, String> {
    let Some(cell) = cell.map(str::trim) else {
        return Ok(None);
    };
    if cell.is_empty() || cell == EMPTY_TAGS {
        return Ok(None);
    }

    let value = literal::parse(cell).map_err(|e| format!("invalid tags: {}", e))?;
    let entries = value
        .as_array()
        .ok_or_else(|| "invalid tags: expected a list".to_string())?;

    let mut tags = Vec::with_capacity(entries.len());
    for entry in entries {
        let map = entry
            .as_object()
            .ok_or_else(|| "invalid tags: expected a list of maps".to_string())?;
        let key = match map.get("Key") {
            Some(serde_json::Value::String(key)) => key.clone(),
            Some(serde_json::Value::Null) | None => {
                return Err("invalid tags: entry without Key".to_string());
            }
            Some(other) => other.to_string(),
        };
        let value = match map.get("Value") {
            Some(serde_json::Value::String(value)) => Some(value.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        if key.trim().is_empty() {
            continue;
        }
        tags.push(Tag { key, value });
    }
    Ok(Some(tags))
}

/// Incremental extractor
///
/// Feed records with [`Extractor::add`]; bad rows become warnings.
#[derive(Debug, Default)]
pub struct Extractor {
    extraction: Extraction,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record. Returns the parsed tags when the row contributed.
    pub fn add(&mut self, record: &ResourceRecord) -> Option<Vec<Tag>> {
        let resource_id = record
            .resource_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())?;

        match parse_tags(record.tags.as_deref()) {
            Ok(Some(tags)) => {
                for tag in &tags {
                    self.extraction.all_keys.insert(tag.key.clone());
                    self.extraction
                        .associations
                        .insert(tag.key.clone(), resource_id);
                }
                Some(tags)
            }
            Ok(None) => None,
            Err(reason) => {
                self.skip(RowWarning {
                    line: record.line,
                    row: record.to_string(),
                    reason,
                });
                None
            }
        }
    }

    /// Record a row that could not be read at all
    pub fn skip(&mut self, warning: RowWarning) {
        log::warn!("skipping row: {}", warning);
        self.extraction.warnings.push(warning);
    }

    pub fn finish(self) -> Extraction {
        log::debug!(
            "extracted {} tag keys, {} rows skipped",
            self.extraction.all_keys.len(),
            self.extraction.warnings.len()
        );
        self.extraction
    }
}

/// Extract tag keys and associations from records
pub fn extract<'a, I>(records: I) -> Extraction
where
    I: IntoIterator<Item = &'a ResourceRecord>,
{
    let mut extractor = Extractor::new();
    for record in records {
        extractor.add(record);
    }
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basic() {
        let rows = vec![
            ResourceRecord::new("vpc-1", "[{'Key':'env','Value':'prod'}]"),
            ResourceRecord::new("vpc-2", "[]"),
        ];
        let extraction = extract(&rows);
        assert_eq!(extraction.all_keys.len(), 1);
        assert!(extraction.all_keys.contains("env"));
        let resources = extraction.associations.resources("env").unwrap();
        assert_eq!(resources.iter().collect::<Vec<_>>(), vec!["vpc-1"]);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_all_keys_is_union_of_parsed_rows() {
        let rows = vec![
            ResourceRecord::new("vpc-1", "[{'Key':'env','Value':'prod'},{'Key':'owner','Value':'a'}]"),
            ResourceRecord::new("vpc-2", "[{'Key':'broken'"),
            ResourceRecord::new("vpc-3", r#"[{"Key":"cost-center","Value":"42"}]"#),
        ];
        let extraction = extract(&rows);
        let keys: Vec<_> = extraction.all_keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["cost-center", "env", "owner"]);
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].row, "vpc-2,[{'Key':'broken'");
    }

    #[test]
    fn test_bad_row_does_not_contribute_partially() {
        // Second entry is malformed, the first must not leak in
        let rows = vec![ResourceRecord::new("vpc-1", "[{'Key':'env'}, {'Value':'x'}]")];
        let extraction = extract(&rows);
        assert!(extraction.all_keys.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].reason.contains("without Key"));
    }

    #[test]
    fn test_missing_id_contributes_nothing() {
        let rows = vec![ResourceRecord {
            resource_id: None,
            tags: Some("[{'Key':'env','Value':'prod'}]".to_string()),
            ..Default::default()
        }];
        let extraction = extract(&rows);
        assert!(extraction.all_keys.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_blank_tags_contribute_nothing() {
        let rows = vec![
            ResourceRecord::new("vpc-1", ""),
            ResourceRecord {
                resource_id: Some("vpc-2".to_string()),
                ..Default::default()
            },
        ];
        let extraction = extract(&rows);
        assert!(extraction.all_keys.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_pairs_are_idempotent() {
        let rows = vec![
            ResourceRecord::new("vpc-1", "[{'Key':'env','Value':'prod'}]"),
            ResourceRecord::new("vpc-1", "[{'Key':'env','Value':'dev'}]"),
        ];
        let extraction = extract(&rows);
        assert_eq!(extraction.associations.resources("env").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_tags_values() {
        let tags = parse_tags(Some("[{'Key': 'a', 'Value': None}, {'Key': 'n', 'Value': 5}]"))
            .unwrap()
            .unwrap();
        assert_eq!(tags[0].value, None);
        assert_eq!(tags[1].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_parse_tags_drops_empty_keys() {
        let tags = parse_tags(Some("[{'Key': '', 'Value': 'x'}, {'Key': 'env', 'Value': 'y'}]"))
            .unwrap()
            .unwrap();
        assert_eq!(tags, vec![Tag::new("env", "y")]);
    }

    #[test]
    fn test_parse_tags_rejects_non_list() {
        assert!(parse_tags(Some("{'Key': 'env'}")).is_err());
        assert!(parse_tags(Some("['env']")).is_err());
    }
}
