//! Analysis export: `<base>.json` and a sectioned `<base>.csv`

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use reconcile::Report;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default base name, e.g. `extended-attributes_20240131_154500`
pub fn default_base_name(now: DateTime<Local>) -> String {
    format!("extended-attributes_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Files written by [`write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Write the report next to `base` with `.json` and `.csv` extensions
pub fn write(report: &Report, base: &Path) -> Result<Written> {
    let json = with_suffix(base, "json");
    let csv = with_suffix(base, "csv");

    if let Some(parent) = json.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = report.to_json().context("Failed to serialize report")?;
    fs::write(&json, content).with_context(|| format!("Failed to write {}", json.display()))?;

    let file =
        fs::File::create(&csv).with_context(|| format!("Failed to create {}", csv.display()))?;
    write_csv(report, file).with_context(|| format!("Failed to write {}", csv.display()))?;

    log::info!("Exported {} and {}", json.display(), csv.display());
    Ok(Written { json, csv })
}

/// `base` plus an extension, keeping any dots already in the name
fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_csv<W: io::Write>(report: &Report, writer: W) -> Result<()> {
    let diff = report.diff();
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    wtr.write_record(["Report Section", "Details"])?;
    wtr.write_record(["All AWS Tags", join(diff.all_local_keys()).as_str()])?;
    wtr.write_record(["All Infoblox EAs", join(diff.all_remote_names()).as_str()])?;
    wtr.write_record([
        "Missing EAs in Infoblox",
        join(diff.missing_in_remote()).as_str(),
    ])?;

    wtr.write_record([""])?;
    wtr.write_record(["Potential Duplicates"])?;
    wtr.write_record(["Tag", "Similar Attribute", "Score"])?;
    for dup in diff.potential_duplicates() {
        wtr.write_record([
            dup.key.as_str(),
            dup.candidate.as_str(),
            dup.score.to_string().as_str(),
        ])?;
    }

    wtr.write_record([""])?;
    wtr.write_record(["Tag Usage"])?;
    wtr.write_record(["Tag", "Resource IDs"])?;
    for (key, resources) in report.associations().iter() {
        wtr.write_record([key.as_str(), join(resources).as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reconcile::{Reconciler, ResourceRecord};
    use tempfile::TempDir;
    use wapi::{Client, MockBackend, View};

    fn sample_report() -> Report {
        let mock = MockBackend::with_attribute_definitions(["Owner", "CreatedBy"]);
        let client = Client::with_backend(Box::new(mock), View::All);
        let rows: Vec<reconcile::Row> = vec![
            Ok(ResourceRecord::new(
                "vpc-1",
                "[{'Key': 'Owner', 'Value': 'a'}, {'Key': 'Created_By', 'Value': 'b'}]",
            )
            .at_line(2)),
            Ok(ResourceRecord::new("vpc-2", "[{'Key': 'Env', 'Value': 'prod'}]").at_line(3)),
        ];
        Reconciler::new(&client).analyze_rows(rows).unwrap()
    }

    #[test]
    fn test_default_base_name() {
        let now = Local.with_ymd_and_hms(2024, 1, 31, 15, 45, 0).unwrap();
        assert_eq!(
            default_base_name(now),
            "extended-attributes_20240131_154500"
        );
    }

    #[test]
    fn test_with_suffix_keeps_dots() {
        assert_eq!(
            with_suffix(Path::new("out/report.v2"), "csv"),
            PathBuf::from("out/report.v2.csv")
        );
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("reports").join("analysis");

        let written = write(&sample_report(), &base).unwrap();
        assert_eq!(written.json, dir.path().join("reports/analysis.json"));
        assert!(written.json.exists());
        assert!(written.csv.exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.json).unwrap()).unwrap();
        assert_eq!(json["missing_in_remote"], serde_json::json!(["Created_By", "Env"]));
    }

    #[test]
    fn test_csv_sections() {
        let mut out = Vec::new();
        write_csv(&sample_report(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Report Section,Details\n"));
        assert!(text.contains("All AWS Tags,\"Created_By, Env, Owner\"\n"));
        assert!(text.contains("All Infoblox EAs,\"CreatedBy, Owner\"\n"));
        assert!(text.contains("Missing EAs in Infoblox,\"Created_By, Env\"\n"));
        assert!(text.contains("Tag,Similar Attribute,Score\nCreated_By,CreatedBy,"));
        assert!(text.contains("Tag,Resource IDs\n"));
        assert!(text.contains("Env,vpc-2\n"));
        assert!(text.contains("Owner,vpc-1\n"));
    }
}
