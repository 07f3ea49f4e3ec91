//! Reconciliation runs
//!
//! A [`Reconciler`] walks a linear state machine:
//!
//! ```text
//! Init -> Extracted -> Fetched -> Diffed -> (Mutating) -> Done
//!    \________\____________> Failed(step)
//! ```
//!
//! Extraction and fetch failures end the run. Mutations are optional, gated
//! by a confirmation callback, and never fail the run: per-key outcomes end
//! up in the returned [`BatchReport`].

use crate::batch::{self, BatchReport, CreateOptions, DeleteTarget, Operation};
use crate::context::{ConfirmCallback, ProgressCallback};
use crate::diff::diff;
use crate::error::{Error, Result, Step};
use crate::extract::Extractor;
use crate::report::Report;
use crate::source::{ExportSource, Row};
use crate::types::Extraction;
use std::collections::BTreeSet;
use std::fmt;
use wapi::Client;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Extracted,
    Fetched,
    Diffed,
    Mutating,
    Done,
    Failed(Step),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => f.write_str("Init"),
            RunState::Extracted => f.write_str("Extracted"),
            RunState::Fetched => f.write_str("Fetched"),
            RunState::Diffed => f.write_str("Diffed"),
            RunState::Mutating => f.write_str("Mutating"),
            RunState::Done => f.write_str("Done"),
            RunState::Failed(step) => write!(f, "Failed({})", step),
        }
    }
}

/// One reconciliation run against one appliance
pub struct Reconciler<'a> {
    client: &'a Client,
    state: RunState,
    extraction: Option<Extraction>,
    remote_names: Option<BTreeSet<String>>,
    report: Option<Report>,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            state: RunState::Init,
            extraction: None,
            remote_names: None,
            report: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The report, once diffed
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    fn expect_state(&self, expected: RunState, name: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected: name,
                actual: self.state.to_string(),
            })
        }
    }

    /// Init -> Extracted, reading an export from disk.
    pub fn extract(&mut self, source: &ExportSource) -> Result<&Extraction> {
        self.expect_state(RunState::Init, "Init")?;
        log::info!("reading export {}", source.path().display());
        match source.open() {
            Ok(reader) => self.extract_rows(reader),
            Err(e) => {
                self.state = RunState::Failed(Step::Extract);
                Err(e)
            }
        }
    }

    /// Init -> Extracted, from rows already read.
    pub fn extract_rows<I>(&mut self, rows: I) -> Result<&Extraction>
    where
        I: IntoIterator<Item = Row>,
    {
        self.expect_state(RunState::Init, "Init")?;
        let mut extractor = Extractor::new();
        for row in rows {
            match row {
                Ok(record) => {
                    extractor.add(&record);
                }
                Err(warning) => extractor.skip(warning),
            }
        }
        self.state = RunState::Extracted;
        Ok(self.extraction.insert(extractor.finish()))
    }

    /// Extracted -> Fetched: list every remote attribute definition.
    pub fn fetch(&mut self) -> Result<&BTreeSet<String>> {
        self.expect_state(RunState::Extracted, "Extracted")?;
        match self.client.attribute_definitions() {
            Ok(definitions) => {
                let names: BTreeSet<String> = definitions.into_iter().map(|d| d.name).collect();
                log::debug!("fetched {} attribute definitions", names.len());
                self.state = RunState::Fetched;
                Ok(self.remote_names.insert(names))
            }
            Err(e) => {
                log::error!("fetching attribute definitions failed: {}", e);
                self.state = RunState::Failed(Step::Fetch);
                Err(Error::Fetch(e))
            }
        }
    }

    /// Fetched -> Diffed.
    pub fn diff(&mut self) -> Result<&Report> {
        self.expect_state(RunState::Fetched, "Fetched")?;
        let (Some(extraction), Some(remote_names)) = (&self.extraction, &self.remote_names) else {
            return Err(Error::InvalidState {
                expected: "Fetched",
                actual: self.state.to_string(),
            });
        };

        let report = Report::new(
            diff(&extraction.all_keys, remote_names),
            extraction.associations.clone(),
            extraction.warnings.clone(),
        );
        self.state = RunState::Diffed;
        Ok(self.report.insert(report))
    }

    /// Extract, fetch and diff in one go.
    pub fn analyze(&mut self, source: &ExportSource) -> Result<Report> {
        self.extract(source)?;
        self.fetch()?;
        self.diff().cloned()
    }

    /// Same as [`Reconciler::analyze`] over rows already read.
    pub fn analyze_rows<I>(&mut self, rows: I) -> Result<Report>
    where
        I: IntoIterator<Item = Row>,
    {
        self.extract_rows(rows)?;
        self.fetch()?;
        self.diff().cloned()
    }

    /// Diffed -> Done: create a definition for every missing key.
    ///
    /// Returns `None` when the user declines; the run stays diffed.
    pub fn create_missing<C, P>(
        &mut self,
        options: &CreateOptions,
        confirm: &mut C,
        progress: &mut P,
    ) -> Result<Option<BatchReport>>
    where
        C: ConfirmCallback + ?Sized,
        P: ProgressCallback + ?Sized,
    {
        self.expect_state(RunState::Diffed, "Diffed")?;
        let missing: Vec<String> = self
            .report
            .as_ref()
            .map(|r| r.diff().missing_in_remote().iter().cloned().collect())
            .unwrap_or_default();

        if missing.is_empty() {
            self.state = RunState::Done;
            return Ok(Some(BatchReport::new(Operation::CreateAttributes)));
        }

        let prompt = format!(
            "Create {} missing attribute definition(s)?",
            missing.len()
        );
        if !confirm.confirm(&prompt)? {
            log::info!("creation declined");
            return Ok(None);
        }

        self.state = RunState::Mutating;
        let report = batch::create_attributes(self.client, &missing, options, progress);
        self.state = RunState::Done;
        Ok(Some(report))
    }

    /// Diffed -> Done: resolve and delete each target.
    ///
    /// Returns `None` when the user declines; the run stays diffed.
    pub fn delete<C, P>(
        &mut self,
        targets: Vec<DeleteTarget>,
        confirm: &mut C,
        progress: &mut P,
    ) -> Result<Option<BatchReport>>
    where
        C: ConfirmCallback + ?Sized,
        P: ProgressCallback + ?Sized,
    {
        self.expect_state(RunState::Diffed, "Diffed")?;
        if targets.is_empty() {
            self.state = RunState::Done;
            return Ok(Some(BatchReport::new(Operation::Delete)));
        }

        let prompt = format!("Delete {} object(s)?", targets.len());
        if !confirm.confirm(&prompt)? {
            log::info!("deletion declined");
            return Ok(None);
        }

        self.state = RunState::Mutating;
        let report = batch::delete_targets(self.client, targets, progress);
        self.state = RunState::Done;
        Ok(Some(report))
    }

    /// Finish the run and hand out the report.
    pub fn finish(mut self) -> Result<Report> {
        match self.state {
            RunState::Diffed | RunState::Done => {}
            _ => {
                return Err(Error::InvalidState {
                    expected: "Diffed or Done",
                    actual: self.state.to_string(),
                });
            }
        }
        self.state = RunState::Done;
        self.report.take().ok_or(Error::InvalidState {
            expected: "Diffed or Done",
            actual: self.state.to_string(),
        })
    }
}
