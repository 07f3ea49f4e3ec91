//! Batch mutations against the appliance
//!
//! Every batch runs sequentially, one remote call per key, in sorted key
//! order. A failure is recorded against its key and the batch moves on;
//! nothing is rolled back. Deletes always resolve the natural key to a
//! fresh reference right before acting on it.

use crate::context::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use wapi::{
    AttributeType, Client, ExtAttrValue, NewAttributeDefinition, NewNetwork, ObjectRef, View,
};

/// Kind of batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateAttributes,
    CreateNetworks,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAttributes => f.write_str("create attribute definitions"),
            Operation::CreateNetworks => f.write_str("create networks"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Remote call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    Create,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => f.write_str("resolve"),
            Stage::Create => f.write_str("create"),
            Stage::Delete => f.write_str("delete"),
        }
    }
}

/// Outcome for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationResult {
    Created { reference: ObjectRef },
    Deleted { reference: ObjectRef },
    /// Nothing matched the natural key
    AlreadyAbsent,
    /// The object already exists
    Unchanged,
    Failed {
        stage: Stage,
        message: String,
        status: Option<u16>,
    },
    Skipped { reason: String },
}

impl MutationResult {
    fn failed(stage: Stage, err: &wapi::Error) -> Self {
        Self::Failed {
            stage,
            message: err.to_string(),
            status: err.status(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Deleted { .. })
    }
}

impl fmt::Display for MutationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { .. } => f.write_str("created"),
            Self::Deleted { .. } => f.write_str("deleted"),
            Self::AlreadyAbsent => f.write_str("already absent"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Failed {
                stage,
                message,
                status: Some(status),
            } => write!(f, "{} failed (HTTP {}): {}", stage, status, message),
            Self::Failed { stage, message, .. } => write!(f, "{} failed: {}", stage, message),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// A key and what happened to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutcome {
    pub key: String,
    pub result: MutationResult,
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub created: usize,
    pub deleted: usize,
    pub already_absent: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn add_result(&mut self, result: &MutationResult) {
        match result {
            MutationResult::Created { .. } => self.created += 1,
            MutationResult::Deleted { .. } => self.deleted += 1,
            MutationResult::AlreadyAbsent => self.already_absent += 1,
            MutationResult::Unchanged => self.unchanged += 1,
            MutationResult::Failed { .. } => self.failed += 1,
            MutationResult::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created
            + self.deleted
            + self.already_absent
            + self.unchanged
            + self.failed
            + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Per-key results of one batch, in sorted key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub operation: Operation,
    pub outcomes: Vec<KeyOutcome>,
    /// The progress callback stopped the batch early
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            outcomes: Vec::new(),
            cancelled: false,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for outcome in &self.outcomes {
            summary.add_result(&outcome.result);
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = &KeyOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_failure())
    }

    /// Outcome for a key
    pub fn get(&self, key: &str) -> Option<&MutationResult> {
        self.outcomes
            .iter()
            .find(|o| o.key == key)
            .map(|o| &o.result)
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Settings for newly created attribute definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    pub attribute_type: AttributeType,
    pub comment: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            attribute_type: AttributeType::String,
            comment: NewAttributeDefinition::DEFAULT_COMMENT.to_string(),
        }
    }
}

/// Something to delete, by natural key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeleteTarget {
    Attribute {
        name: String,
    },
    Network {
        cidr: String,
        /// Overrides the client's view
        #[serde(default)]
        view: Option<String>,
    },
}

impl DeleteTarget {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute { name: name.into() }
    }

    pub fn network(cidr: impl Into<String>, view: Option<&str>) -> Self {
        Self::Network {
            cidr: cidr.into(),
            view: view.map(str::to_string),
        }
    }

    /// Key used in reports
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute { name } => f.write_str(name),
            Self::Network {
                cidr,
                view: Some(view),
            } => write!(f, "{} ({})", cidr, view),
            Self::Network { cidr, view: None } => f.write_str(cidr),
        }
    }
}

/// A network to create when absent, with its extensible attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlan {
    pub cidr: String,
    pub comment: String,
    pub extattrs: BTreeMap<String, String>,
}

/// Run `apply` for each key, honouring cancellation
fn run<T, P, F>(
    operation: Operation,
    items: Vec<(String, T)>,
    progress: &mut P,
    mut apply: F,
) -> BatchReport
where
    P: ProgressCallback + ?Sized,
    F: FnMut(&T) -> MutationResult,
{
    let mut report = BatchReport::new(operation);
    progress.on_batch_start(operation, items.len());

    for (key, item) in items {
        if report.cancelled || !progress.should_continue() {
            if !report.cancelled {
                log::warn!("{} cancelled", operation);
            }
            report.cancelled = true;
            report.outcomes.push(KeyOutcome {
                key,
                result: MutationResult::Skipped {
                    reason: "cancelled".to_string(),
                },
            });
            continue;
        }

        progress.on_item_start(&key);
        let result = apply(&item);
        progress.on_item_complete(&key, &result);
        report.outcomes.push(KeyOutcome { key, result });
    }

    progress.on_batch_complete(&report);
    report
}

/// Create one attribute definition per key, in sorted order.
pub fn create_attributes<'a, I, P>(
    client: &Client,
    keys: I,
    options: &CreateOptions,
    progress: &mut P,
) -> BatchReport
where
    I: IntoIterator<Item = &'a String>,
    P: ProgressCallback + ?Sized,
{
    let keys: BTreeSet<&String> = keys.into_iter().collect();
    let items = keys.into_iter().map(|k| (k.clone(), k.clone())).collect();

    run(Operation::CreateAttributes, items, progress, |name: &String| {
        let definition = NewAttributeDefinition {
            name: name.clone(),
            attribute_type: options.attribute_type,
            comment: options.comment.clone(),
        };
        match client.create_attribute_definition(&definition) {
            Ok(reference) => MutationResult::Created { reference },
            Err(e) => {
                log::warn!("failed to create {}: {}", name, e);
                MutationResult::failed(Stage::Create, &e)
            }
        }
    })
}

/// Resolve and delete each target, in sorted order.
///
/// A target that no longer exists is reported as already absent.
pub fn delete_targets<I, P>(client: &Client, targets: I, progress: &mut P) -> BatchReport
where
    I: IntoIterator<Item = DeleteTarget>,
    P: ProgressCallback + ?Sized,
{
    let targets: BTreeSet<DeleteTarget> = targets.into_iter().collect();
    let items = targets.into_iter().map(|t| (t.key(), t)).collect();

    run(Operation::Delete, items, progress, |target: &DeleteTarget| {
        let resolved = match target {
            DeleteTarget::Attribute { name } => client.resolve_attribute_definition(name),
            DeleteTarget::Network { cidr, view } => {
                let view = view.as_deref().map(View::from);
                client.resolve_network(cidr, view.as_ref())
            }
        };

        let reference = match resolved {
            Ok(Some(reference)) => reference,
            Ok(None) => {
                log::info!("{} is already absent", target);
                return MutationResult::AlreadyAbsent;
            }
            Err(e) => {
                log::warn!("failed to resolve {}: {}", target, e);
                return MutationResult::failed(Stage::Resolve, &e);
            }
        };

        match client.delete(&reference) {
            Ok(reference) => MutationResult::Deleted { reference },
            Err(e) => {
                log::warn!("failed to delete {}: {}", target, e);
                MutationResult::failed(Stage::Delete, &e)
            }
        }
    })
}

/// Create each planned network that does not exist yet in the client's view.
pub fn create_networks<I, P>(client: &Client, plans: I, progress: &mut P) -> BatchReport
where
    I: IntoIterator<Item = NetworkPlan>,
    P: ProgressCallback + ?Sized,
{
    let mut by_cidr: BTreeMap<String, NetworkPlan> = BTreeMap::new();
    for plan in plans {
        if by_cidr.contains_key(&plan.cidr) {
            log::debug!("{} planned twice, keeping the first", plan.cidr);
            continue;
        }
        by_cidr.insert(plan.cidr.clone(), plan);
    }
    let items = by_cidr.into_iter().collect();

    run(Operation::CreateNetworks, items, progress, |plan: &NetworkPlan| {
        match client.resolve_network(&plan.cidr, None) {
            Ok(Some(_)) => return MutationResult::Unchanged,
            Ok(None) => {}
            Err(e) => return MutationResult::failed(Stage::Resolve, &e),
        }

        let network = NewNetwork {
            network: plan.cidr.clone(),
            network_view: None,
            comment: plan.comment.clone(),
            extattrs: plan
                .extattrs
                .iter()
                .map(|(k, v)| (k.clone(), ExtAttrValue { value: v.clone() }))
                .collect(),
        };
        match client.create_network(&network) {
            Ok(reference) => MutationResult::Created { reference },
            Err(e) => {
                log::warn!("failed to create network {}: {}", plan.cidr, e);
                MutationResult::failed(Stage::Create, &e)
            }
        }
    })
}
