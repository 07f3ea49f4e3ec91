//! CSV resource exports
//!
//! The export is a CSV file with a header row. Only three columns are read:
//! the resource id, the stringified tag list and (optionally) the address
//! block. Everything else is ignored.

use crate::error::{Error, Result};
use crate::types::{ResourceRecord, RowWarning};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A row read from an export: a record, or the reason it was unreadable
pub type Row = std::result::Result<ResourceRecord, RowWarning>;

/// Column names of an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub id: String,
    pub tags: String,
    pub cidr: Option<String>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            id: "VpcId".to_string(),
            tags: "Tags".to_string(),
            cidr: Some("CidrBlock".to_string()),
        }
    }
}

/// A resource export on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSource {
    path: PathBuf,
    columns: Columns,
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: Columns::default(),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Open the export and validate its header
    pub fn open(&self) -> Result<ExportReader<File>> {
        let file = File::open(&self.path).map_err(|e| Error::extract(&self.path, e))?;
        ExportReader::new(file, &self.columns).map_err(|e| Error::extract(&self.path, e))
    }

    /// Read every row
    pub fn rows(&self) -> Result<Vec<Row>> {
        Ok(self.open()?.collect())
    }
}

/// Iterator over the rows of an export
pub struct ExportReader<R: io::Read> {
    records: csv::ByteRecordsIntoIter<R>,
    id: usize,
    tags: usize,
    cidr: Option<usize>,
}

impl<R: io::Read> ExportReader<R> {
    /// Read the header and locate the columns.
    ///
    /// The id and tags columns are required.
    pub fn new(reader: R, columns: &Columns) -> std::result::Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| format!("failed to read header: {}", e))?
            .clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let id = find(&columns.id).ok_or_else(|| format!("missing column '{}'", columns.id))?;
        let tags =
            find(&columns.tags).ok_or_else(|| format!("missing column '{}'", columns.tags))?;
        let cidr = columns.cidr.as_deref().and_then(find);

        Ok(Self {
            records: reader.into_byte_records(),
            id,
            tags,
            cidr,
        })
    }

    fn decode(&self, record: csv::ByteRecord) -> Row {
        let line = record.position().map_or(0, |p| p.line() as usize);
        let raw = raw_line(&record);

        let record = match csv::StringRecord::from_byte_record(record) {
            Ok(record) => record,
            Err(e) => {
                return Err(RowWarning {
                    line,
                    row: raw,
                    reason: format!("unreadable row: {}", e),
                });
            }
        };
        let cell = |index: usize| {
            record
                .get(index)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(ResourceRecord {
            line,
            resource_id: cell(self.id),
            tags: cell(self.tags),
            cidr: self.cidr.and_then(cell),
            raw: Some(raw),
        })
    }
}

/// Re-encode a record as a single CSV line; invalid UTF-8 is replaced
fn raw_line(record: &csv::ByteRecord) -> String {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if let Err(e) = writer.write_byte_record(record) {
        log::debug!("failed to re-encode row: {}", e);
        return String::new();
    }
    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .trim_end_matches('\n')
            .to_string(),
        Err(_) => String::new(),
    }
}

impl<R: io::Read> Iterator for ExportReader<R> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        Some(match self.records.next()? {
            Ok(record) => self.decode(record),
            Err(e) => Err(RowWarning {
                line: e.position().map_or(0, |p| p.line() as usize),
                row: String::new(),
                reason: format!("unreadable row: {}", e),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = "\
VpcId,CidrBlock,State,Tags
vpc-1,10.0.0.0/16,available,\"[{'Key': 'env', 'Value': 'prod'}]\"
vpc-2,10.1.0.0/16,available,[]
";

    #[test]
    fn test_read_rows() {
        let rows: Vec<Row> = ExportReader::new(EXPORT.as_bytes(), &Columns::default())
            .unwrap()
            .collect();
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.line, 2);
        assert_eq!(first.resource_id.as_deref(), Some("vpc-1"));
        assert_eq!(first.cidr.as_deref(), Some("10.0.0.0/16"));
        assert_eq!(
            first.tags.as_deref(),
            Some("[{'Key': 'env', 'Value': 'prod'}]")
        );
        assert_eq!(rows[1].as_ref().unwrap().tags.as_deref(), Some("[]"));
    }

    #[test]
    fn test_missing_required_column() {
        let err = ExportReader::new("VpcId,Name\nvpc-1,a\n".as_bytes(), &Columns::default())
            .err()
            .unwrap();
        assert!(err.contains("'Tags'"));
    }

    #[test]
    fn test_optional_cidr_column() {
        let rows: Vec<Row> = ExportReader::new("VpcId,Tags\nvpc-1,[]\n".as_bytes(), &Columns::default())
            .unwrap()
            .collect();
        assert_eq!(rows[0].as_ref().unwrap().cidr, None);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let rows: Vec<Row> = ExportReader::new("VpcId,Tags\nvpc-1\n".as_bytes(), &Columns::default())
            .unwrap()
            .collect();
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.resource_id.as_deref(), Some("vpc-1"));
        assert_eq!(record.tags, None);
    }

    #[test]
    fn test_custom_columns() {
        let columns = Columns {
            id: "SubnetId".to_string(),
            tags: "TagList".to_string(),
            cidr: None,
        };
        let rows: Vec<Row> = ExportReader::new("SubnetId,TagList\nsubnet-1,[]\n".as_bytes(), &columns)
            .unwrap()
            .collect();
        assert_eq!(rows[0].as_ref().unwrap().resource_id.as_deref(), Some("subnet-1"));
    }

    #[test]
    fn test_raw_row_keeps_every_column() {
        let rows: Vec<Row> = ExportReader::new(EXPORT.as_bytes(), &Columns::default())
            .unwrap()
            .collect();
        assert_eq!(
            rows[0].as_ref().unwrap().raw.as_deref(),
            Some("vpc-1,10.0.0.0/16,available,\"[{'Key': 'env', 'Value': 'prod'}]\"")
        );
    }

    #[test]
    fn test_invalid_utf8_row_is_a_warning() {
        let mut data = b"VpcId,Tags\nvpc-1,[]\nvpc-".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.extend_from_slice(b",\"[{'Key': 'env', 'Value': 'prod'}]\"\nvpc-3,[]\n");

        let rows: Vec<Row> = ExportReader::new(data.as_slice(), &Columns::default())
            .unwrap()
            .collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[2].is_ok());

        let warning = rows[1].as_ref().unwrap_err();
        assert_eq!(warning.line, 3);
        assert!(warning.reason.starts_with("unreadable row"));
        assert_eq!(
            warning.row,
            "vpc-\u{fffd}\u{fffd},\"[{'Key': 'env', 'Value': 'prod'}]\""
        );
    }

    #[test]
    fn test_bad_tags_warning_carries_whole_row() {
        let data = "\
VpcId,CidrBlock,State,Tags
vpc-1,10.0.0.0/16,available,\"[{'Key': 'env', 'Value'\"
";
        let rows: Vec<Row> = ExportReader::new(data.as_bytes(), &Columns::default())
            .unwrap()
            .collect();
        let records: Vec<ResourceRecord> = rows.into_iter().map(|r| r.unwrap()).collect();

        let extraction = crate::extract::extract(&records);
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].line, 2);
        assert_eq!(
            extraction.warnings[0].row,
            "vpc-1,10.0.0.0/16,available,\"[{'Key': 'env', 'Value'\""
        );
    }

    #[test]
    fn test_source_open_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();

        let source = ExportSource::new(file.path());
        assert_eq!(source.rows().unwrap().len(), 2);
    }

    #[test]
    fn test_source_missing_file() {
        let source = ExportSource::new("/nonexistent/vpcs.csv");
        let err = source.open().err().unwrap();
        assert_eq!(err.step(), Some(crate::Step::Extract));
    }
}
