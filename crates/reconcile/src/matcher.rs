//! Fuzzy name matching
//!
//! Scores are 0-100. [`score`] is a weighted combination of several
//! comparisons on normalized text (lowercase, punctuation turned into
//! spaces):
//!
//! - plain edit-distance similarity
//! - the same after sorting the words (`"by created"` vs `"created by"`)
//! - a set comparison that ignores repeated and extra words
//! - best substring alignment, for strings of very different length
//!
//! Word-based comparisons are slightly discounted so a plain match always
//! wins over a reordered one.

use std::collections::BTreeSet;

/// Discount on word-order and word-set scores
const TOKEN_SCALE: f64 = 0.95;
/// Discount on substring scores when one name is 1.5 to 8 times the other
const PARTIAL_SCALE: f64 = 0.90;
/// Discount on substring scores when one name is more than 8 times the other
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// Lowercase, replace anything that is not a letter or digit with a space,
/// and collapse runs of whitespace.
pub fn normalize(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase and drop everything but letters and digits.
///
/// Two names with the same folded form differ only in case or punctuation.
pub fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Similarity of two names, 0-100.
pub fn score(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (&a, &b)
    } else {
        (&b, &a)
    };
    let len_ratio = longer.chars().count() as f64 / shorter.chars().count() as f64;

    let base = ratio(&a, &b);
    let best = if len_ratio < 1.5 {
        base.max(token_sort_ratio(&a, &b) * TOKEN_SCALE)
            .max(token_set_ratio(&a, &b) * TOKEN_SCALE)
    } else {
        let scale = if len_ratio < 8.0 {
            PARTIAL_SCALE
        } else {
            LONG_PARTIAL_SCALE
        };
        let sorted_short = sort_tokens(shorter);
        let sorted_long = sort_tokens(longer);
        base.max(partial_ratio(shorter, longer) * scale)
            .max(partial_ratio(&sorted_short, &sorted_long) * TOKEN_SCALE * scale)
    };

    best.round().clamp(0.0, 100.0) as u8
}

/// Best-scoring candidate for `query`.
///
/// On equal scores the earliest candidate wins, so callers that need
/// reproducible results should iterate candidates in a fixed order.
pub fn best_match<'a, I>(query: &str, candidates: I) -> Option<(&'a str, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;
    for candidate in candidates {
        let s = score(query, candidate);
        if best.is_none_or(|(_, top)| s > top) {
            best = Some((candidate, s));
        }
    }
    best
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();

    let common = join(left.intersection(&right));
    let only_left = join(left.difference(&right));
    let only_right = join(right.difference(&left));

    let with_left = join_nonempty(&common, &only_left);
    let with_right = join_nonempty(&common, &only_right);

    ratio(&common, &with_left)
        .max(ratio(&common, &with_right))
        .max(ratio(&with_left, &with_right))
}

fn join<S: AsRef<str>>(tokens: impl Iterator<Item = S>) -> String {
    tokens
        .map(|t| t.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

/// Best similarity between `shorter` and any same-length window of `longer`.
fn partial_ratio(shorter: &str, longer: &str) -> f64 {
    let short: Vec<char> = shorter.chars().collect();
    let long: Vec<char> = longer.chars().collect();
    if short.is_empty() || long.is_empty() {
        return 0.0;
    }
    if short.len() >= long.len() {
        return ratio(shorter, longer);
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        let window: String = window.iter().collect();
        best = best.max(ratio(shorter, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Created_By"), "created by");
        assert_eq!(normalize("  cost--center "), "cost center");
        assert_eq!(normalize("__"), "");
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("Created_By"), "createdby");
        assert_eq!(fold("createdby"), fold("Created-By"));
        assert_ne!(fold("createdby"), fold("created"));
    }

    #[test]
    fn test_identical_scores_100() {
        assert_eq!(score("env", "env"), 100);
        assert_eq!(score("Env", "env"), 100);
        assert_eq!(score("cost_center", "Cost-Center"), 100);
    }

    #[test]
    fn test_punctuation_variant_scores_high() {
        let s = score("Created_By", "createdby");
        assert!(s > 80, "score was {}", s);
        assert!(s < 100);
    }

    #[test]
    fn test_reordered_words() {
        assert_eq!(score("created by", "by created"), 95);
    }

    #[test]
    fn test_unrelated_scores_low() {
        assert!(score("env", "owner") < 50);
        assert_eq!(score("", "owner"), 0);
        assert_eq!(score("___", "owner"), 0);
    }

    #[test]
    fn test_substring_is_discounted() {
        let s = score("env", "environment_name");
        assert!(s <= 90, "score was {}", s);
        assert!(s > 50, "score was {}", s);
    }

    #[test]
    fn test_best_match_prefers_highest() {
        let candidates = ["owner", "createdby", "creator"];
        let (name, s) = best_match("Created_By", candidates).unwrap();
        assert_eq!(name, "createdby");
        assert!(s > 80);
    }

    #[test]
    fn test_best_match_first_wins_ties() {
        let (name, _) = best_match("env", ["ENV", "Env"]).unwrap();
        assert_eq!(name, "ENV");
    }

    #[test]
    fn test_best_match_empty() {
        assert_eq!(best_match("env", std::iter::empty()), None);
    }
}
