//! # reconcile
//!
//! Reconciles cloud resource tags with an appliance's extensible attribute
//! schema.
//!
//! This crate provides:
//! - A tag extractor for stringified tag lists in CSV exports
//! - A pure diff between local tag keys and remote definition names, with
//!   fuzzy detection of case and punctuation variants
//! - Batch create and resolve-then-delete mutations with per-key outcomes
//! - A [`Reconciler`] that sequences extract, fetch, diff and mutation
//! - A [`Provider`] capability (search, audit, sync) for the AWS VPC export
//!
//! ## Example
//!
//! ```no_run
//! use reconcile::{AutoConfirm, CreateOptions, ExportSource, NoProgress, Reconciler};
//! use wapi::{Client, Credentials, Endpoint, View};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Endpoint::new("192.0.2.10", Credentials::new("admin", "secret"));
//! let client = Client::connect(&endpoint, View::All)?;
//!
//! let mut run = Reconciler::new(&client);
//! let report = run.analyze(&ExportSource::new("vpcs.csv"))?;
//! println!("{} keys missing", report.diff().missing_in_remote().len());
//!
//! run.create_missing(&CreateOptions::default(), &mut AutoConfirm, &mut NoProgress)?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod context;
pub mod diff;
pub mod error;
pub mod extract;
pub mod literal;
pub mod matcher;
pub mod orchestrator;
pub mod provider;
pub mod report;
pub mod source;
pub mod types;

pub use batch::{
    BatchReport, BatchSummary, CreateOptions, DeleteTarget, KeyOutcome, MutationResult,
    NetworkPlan, Operation, Stage,
};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{DiffReport, DuplicateSuggestion, diff};
pub use error::{Error, Result, Step};
pub use extract::{Extractor, extract, parse_tags};
pub use orchestrator::{Reconciler, RunState};
pub use provider::{
    AuditEntry, AuditReport, AwsProvider, MatchedField, NetworkStatus, Provider, SearchHit,
    SearchQuery, SearchReport, SyncReport,
};
pub use report::Report;
pub use source::{Columns, ExportReader, ExportSource, Row};
pub use types::{Extraction, ResourceAssociations, ResourceRecord, RowWarning, Tag};
