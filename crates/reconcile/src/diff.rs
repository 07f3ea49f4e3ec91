//! Schema diff between local tag keys and remote attribute definitions

use crate::matcher;
use serde::Serialize;
use std::collections::BTreeSet;

/// Minimum score for a duplicate suggestion (exclusive)
pub const DUPLICATE_THRESHOLD: u8 = 80;

/// A local key that probably names an existing definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSuggestion {
    /// Local tag key
    pub key: String,
    /// Remote definition name it resembles
    pub candidate: String,
    /// Similarity, 0-100
    pub score: u8,
}

/// Result of comparing local keys with remote definition names
///
/// Built once by [`diff`] and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    all_local_keys: BTreeSet<String>,
    all_remote_names: BTreeSet<String>,
    missing_in_remote: BTreeSet<String>,
    potential_duplicates: Vec<DuplicateSuggestion>,
}

impl DiffReport {
    pub fn all_local_keys(&self) -> &BTreeSet<String> {
        &self.all_local_keys
    }

    pub fn all_remote_names(&self) -> &BTreeSet<String> {
        &self.all_remote_names
    }

    /// Local keys without an exact (case-sensitive) remote match
    pub fn missing_in_remote(&self) -> &BTreeSet<String> {
        &self.missing_in_remote
    }

    pub fn potential_duplicates(&self) -> &[DuplicateSuggestion] {
        &self.potential_duplicates
    }

    /// No missing keys and no suggestions
    pub fn is_clean(&self) -> bool {
        self.missing_in_remote.is_empty() && self.potential_duplicates.is_empty()
    }
}

/// Compare local tag keys with remote definition names.
///
/// A key missing remotely may still get a duplicate suggestion when its best
/// fuzzy match differs from it only in case or punctuation. Only the single
/// best candidate is considered; the first one wins ties, and candidates are
/// visited in sorted order.
pub fn diff(local_keys: &BTreeSet<String>, remote_names: &BTreeSet<String>) -> DiffReport {
    let missing_in_remote: BTreeSet<String> =
        local_keys.difference(remote_names).cloned().collect();

    let mut potential_duplicates = Vec::new();
    for key in &missing_in_remote {
        let Some((candidate, score)) =
            matcher::best_match(key, remote_names.iter().map(String::as_str))
        else {
            continue;
        };
        if score > DUPLICATE_THRESHOLD
            && candidate != key.as_str()
            && matcher::fold(candidate) == matcher::fold(key)
        {
            log::debug!("'{}' looks like '{}' ({})", key, candidate, score);
            potential_duplicates.push(DuplicateSuggestion {
                key: key.clone(),
                candidate: candidate.to_string(),
                score,
            });
        }
    }

    DiffReport {
        all_local_keys: local_keys.clone(),
        all_remote_names: remote_names.clone(),
        missing_in_remote,
        potential_duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_sets_are_clean() {
        let s = set(&["env", "owner", "Created_By"]);
        let report = diff(&s, &s);
        assert!(report.missing_in_remote().is_empty());
        assert!(report.potential_duplicates().is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_missing_is_case_sensitive() {
        let report = diff(&set(&["Env", "owner"]), &set(&["env", "owner"]));
        assert_eq!(report.missing_in_remote(), &set(&["Env"]));
    }

    #[test]
    fn test_duplicate_and_missing_co_populate() {
        let report = diff(&set(&["Created_By"]), &set(&["createdby"]));
        assert!(report.missing_in_remote().contains("Created_By"));
        assert_eq!(report.potential_duplicates().len(), 1);

        let suggestion = &report.potential_duplicates()[0];
        assert_eq!(suggestion.key, "Created_By");
        assert_eq!(suggestion.candidate, "createdby");
        assert!(suggestion.score > DUPLICATE_THRESHOLD);
    }

    #[test]
    fn test_empty_remote() {
        let report = diff(&set(&["owner", "env"]), &BTreeSet::new());
        assert_eq!(report.missing_in_remote(), &set(&["env", "owner"]));
        assert!(report.potential_duplicates().is_empty());
    }

    #[test]
    fn test_similar_but_different_word_is_not_duplicate() {
        // High score, but not the same name modulo case/punctuation
        let report = diff(&set(&["Environment"]), &set(&["environments"]));
        assert!(report.potential_duplicates().is_empty());
        assert_eq!(report.missing_in_remote().len(), 1);
    }

    #[test]
    fn test_only_top_candidate_is_considered() {
        // "created" outranks "createdby" for "Created_By", and is not a fold match
        let report = diff(&set(&["Created_By"]), &set(&["created", "createdby"]));
        assert!(report.potential_duplicates().is_empty());
    }

    #[test]
    fn test_case_only_duplicate() {
        let report = diff(&set(&["Owner"]), &set(&["owner", "site"]));
        assert_eq!(
            report.potential_duplicates(),
            &[DuplicateSuggestion {
                key: "Owner".to_string(),
                candidate: "owner".to_string(),
                score: 100,
            }]
        );
    }

    #[test]
    fn test_serialize_field_names() {
        let report = diff(&set(&["env"]), &set(&["Env"]));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["missing_in_remote"], serde_json::json!(["env"]));
        assert_eq!(value["all_remote_names"], serde_json::json!(["Env"]));
        assert_eq!(
            value["potential_duplicates"],
            serde_json::json!([{"key": "env", "candidate": "Env", "score": 100}])
        );
    }
}
