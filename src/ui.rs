use colored::Colorize;
use reconcile::{
    AuditReport, BatchReport, MutationResult, NetworkStatus, Report, RowWarning, SearchReport,
};
use wapi::{AttributeDefinition, Network, NetworkView};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Mask a secret for display
pub fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => "********".to_string(),
        _ => "(not set)".to_string(),
    }
}

/// Comma-separated list, or a dimmed "(none)"
fn join_or_none<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        joined
    }
}

// ============================================================================
// Appliance listings
// ============================================================================

pub fn definitions(definitions: &[AttributeDefinition]) {
    header(&format!("Attribute definitions ({})", definitions.len()));
    for def in definitions {
        let comment = def.comment.as_deref().unwrap_or_default();
        println!(
            "  {:<32} {:<8} {}",
            def.name.bold(),
            def.attribute_type.as_str().cyan(),
            comment.dimmed()
        );
    }
}

pub fn networks(networks: &[Network]) {
    header(&format!("Networks ({})", networks.len()));
    for network in networks {
        println!(
            "  {:<20} {:<16} {}",
            network.network.bold(),
            network.network_view.as_deref().unwrap_or("-").cyan(),
            network.comment.as_deref().unwrap_or_default().dimmed()
        );
    }
}

pub fn views(views: &[NetworkView]) {
    header(&format!("Network views ({})", views.len()));
    for view in views {
        if view.is_default {
            println!("  {} {}", view.name.bold(), "(default)".dimmed());
        } else {
            println!("  {}", view.name.bold());
        }
    }
}

// ============================================================================
// Reconciliation output
// ============================================================================

/// Tag keys with no attribute definition
pub fn missing(report: &Report) {
    let missing = report.diff().missing_in_remote();
    if missing.is_empty() {
        success("Every tag key has an attribute definition");
        return;
    }
    header(&format!("Missing attribute definitions ({})", missing.len()));
    for key in missing {
        println!("  {} {}", "•".yellow(), key);
    }
}

pub fn analysis(report: &Report) {
    let diff = report.diff();

    header("Analysis");
    kv("Tag keys", &diff.all_local_keys().len().to_string());
    kv("Attribute definitions", &diff.all_remote_names().len().to_string());
    kv("Missing", &diff.missing_in_remote().len().to_string());

    section("Tag keys");
    println!("  {}", join_or_none(diff.all_local_keys()));

    section("Missing attribute definitions");
    println!("  {}", join_or_none(diff.missing_in_remote()));

    let duplicates = diff.potential_duplicates();
    if !duplicates.is_empty() {
        section("Potential duplicates");
        for dup in duplicates {
            println!(
                "  {} {} {} {}",
                dup.key.yellow(),
                "~".dimmed(),
                dup.candidate,
                format!("({})", dup.score).dimmed()
            );
        }
    }

    section("Tag usage");
    for (key, resources) in report.associations().iter() {
        println!("  {}: {}", key.bold(), join_or_none(resources));
    }

    skipped(report.skipped_rows());
}

pub fn skipped(rows: &[RowWarning]) {
    if rows.is_empty() {
        return;
    }
    section(&format!("Skipped rows ({})", rows.len()));
    for row in rows {
        dim(&row.to_string());
    }
}

/// Per-key outcome table and summary line
pub fn batch(report: &BatchReport) {
    header(&format!("Results: {}", report.operation));
    for outcome in &report.outcomes {
        let marker = match &outcome.result {
            MutationResult::Created { .. } | MutationResult::Deleted { .. } => "✓".green(),
            MutationResult::AlreadyAbsent | MutationResult::Unchanged => "•".dimmed(),
            MutationResult::Failed { .. } => "✗".red(),
            MutationResult::Skipped { .. } => "-".yellow(),
        };
        println!("  {} {:<32} {}", marker, outcome.key, outcome.result);
    }

    let summary = report.summary();
    println!();
    let line = format!(
        "{} created, {} deleted, {} already absent, {} unchanged, {} failed, {} skipped",
        summary.created,
        summary.deleted,
        summary.already_absent,
        summary.unchanged,
        summary.failed,
        summary.skipped
    );
    if report.cancelled {
        warn(&format!("Cancelled: {line}"));
    } else if summary.is_success() {
        success(&line);
    } else {
        error(&line);
    }
}

pub fn search(report: &SearchReport) {
    header(&format!("Matches ({})", report.hits.len()));
    for hit in &report.hits {
        let fields = hit
            .matched
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<24} {:<20} {}",
            hit.resource_id.bold(),
            hit.cidr.as_deref().unwrap_or("-").cyan(),
            fields.dimmed()
        );
    }
    skipped(&report.skipped_rows);
}

pub fn audit(report: &AuditReport) {
    header(&format!("Audit ({} resources)", report.entries.len()));
    for entry in &report.entries {
        let status = match &entry.network {
            NetworkStatus::Present { .. } => "present".green(),
            NetworkStatus::Absent => "absent".yellow(),
            NetworkStatus::Unknown { .. } => "unknown".red(),
        };
        println!(
            "  {:<24} {:<20} {}",
            entry.resource_id.bold(),
            entry.cidr,
            status
        );
        if let NetworkStatus::Unknown { message } = &entry.network {
            dim(message);
        }
        if !entry.undefined_keys.is_empty() {
            dim(&format!(
                "undefined tag keys: {}",
                join_or_none(&entry.undefined_keys)
            ));
        }
    }

    if report.without_cidr > 0 {
        println!();
        dim(&format!("{} resource(s) without a CIDR", report.without_cidr));
    }
    skipped(&report.skipped_rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(Some("secret")), "********");
        assert_eq!(mask(Some("")), "(not set)");
        assert_eq!(mask(None), "(not set)");
    }

    #[test]
    fn test_join_or_none() {
        colored::control::set_override(false);
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_or_none(&items), "a, b");
        assert_eq!(join_or_none(&Vec::<String>::new()), "(none)");
    }
}
