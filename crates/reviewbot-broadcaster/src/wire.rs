//! The wire shapes the operator console actually sees.
//!
//! Nothing here is shared with the internal record types: `PackageRecord`,
//! `ReviewOutcome`, and `RunResult` stay internal-only, and this module is
//! the single place that knows how to flatten them into something
//! `serde_json` can hand to a browser.

use reviewbot_analysis::{FixFailReason, ReviewOutcome, RunResult};
use reviewbot_cache::PackageRecord;
use reviewbot_scheduler::RawDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The projected lifecycle state of one package version: raw
/// manifests and docs are dropped, keeping only what the console renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectedStatus {
    Fetched,
    Checked { outcome: ProjectedOutcome },
    MetaFailed { error: String },
    PrPending,
    PrSent { url: String },
    PrFailed { stage: String, error: String },
}

/// The display-facing summary of a `ReviewOutcome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectedOutcome {
    CouldNotOpenArchive,
    TagNotFound,
    TransportError { detail: String },
    NoErrors,
    FoundErrors { error_count: usize },
    ParsingError { messages: Vec<String> },
    IncorrectProject,
    FixFailed { reason: String },
    NotEnoughIterations,
    NotAnEligiblePackage,
    MissingDependencies { packages: Vec<String> },
}

impl ProjectedOutcome {
    #[must_use]
    pub fn from_review_outcome(outcome: &ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::CouldNotOpenArchive => Self::CouldNotOpenArchive,
            ReviewOutcome::TagNotFound => Self::TagNotFound,
            ReviewOutcome::TransportError(error) => Self::TransportError { detail: error.to_string() },
            ReviewOutcome::RuleRun(result) => Self::from_run_result(result),
        }
    }

    fn from_run_result(result: &RunResult) -> Self {
        match result {
            RunResult::NoErrors => Self::NoErrors,
            RunResult::FoundErrors { errors, .. } => Self::FoundErrors { error_count: errors.len() },
            RunResult::ParsingError(messages) => Self::ParsingError { messages: messages.clone() },
            RunResult::IncorrectProject => Self::IncorrectProject,
            RunResult::FixFailed(reason) => Self::FixFailed { reason: fix_fail_reason_text(reason) },
            RunResult::NotEnoughIterations => Self::NotEnoughIterations,
            RunResult::NotAnEligiblePackage => Self::NotAnEligiblePackage,
            RunResult::MissingDependencies(packages) => Self::MissingDependencies {
                packages: packages.iter().map(ToString::to_string).collect(),
            },
        }
    }
}

fn fix_fail_reason_text(reason: &FixFailReason) -> String {
    match reason {
        FixFailReason::Unchanged => "unchanged".to_string(),
        FixFailReason::SourceCodeInvalid(detail) => format!("source-invalid: {detail}"),
        FixFailReason::OverlappingFixRanges => "overlapping-fix-ranges".to_string(),
    }
}

/// Project a cache record into its wire status, or `None` for `Pending`
/// records, which clients never see.
#[must_use]
pub fn project_record(record: &PackageRecord) -> Option<ProjectedStatus> {
    match record {
        PackageRecord::Pending { .. } => None,
        PackageRecord::Fetched { .. } => Some(ProjectedStatus::Fetched),
        PackageRecord::FetchedAndChecked { outcome, .. } => Some(ProjectedStatus::Checked {
            outcome: ProjectedOutcome::from_review_outcome(outcome),
        }),
        PackageRecord::PrPending { .. } => Some(ProjectedStatus::PrPending),
        PackageRecord::PrSent { url, .. } => Some(ProjectedStatus::PrSent { url: url.clone() }),
        PackageRecord::PrFailed { stage, error, .. } => Some(ProjectedStatus::PrFailed {
            stage: stage.clone(),
            error: error.to_string(),
        }),
        PackageRecord::FetchMetaFailed { error, .. } => Some(ProjectedStatus::MetaFailed { error: error.to_string() }),
    }
}

/// One version's projected status, stamped with the `updateIndex` it was
/// last written at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionedStatus {
    pub version: String,
    pub update_index: u64,
    #[serde(flatten)]
    pub status: ProjectedStatus,
}

/// `packageName -> [(version, projected-status)]`.
pub type DeltaMap = BTreeMap<String, Vec<VersionedStatus>>;

/// Project one raw cache mutation into the single-entry delta map it's
/// broadcast as, or `None` if the record isn't projected at all.
#[must_use]
pub fn project_delta(delta: &RawDelta) -> Option<(String, VersionedStatus)> {
    let status = project_record(&delta.record)?;
    Some((
        delta.name.full_name(),
        VersionedStatus {
            version: delta.version.to_string(),
            update_index: delta.update_index,
            status,
        },
    ))
}

/// Client→server verbs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    ResetBackend,
    ResetRules,
    LoginRequest { password: String },
    PullRequestRequest { name: String },
    RerunPackageRequest { name: String, version: String },
}

/// Server→client verbs, plus a `LoginResult` ack a real websocket
/// client needs to stop waiting on a failed login — login feedback is the
/// ambient part, not one of the core data verbs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Updates { delta: DeltaMap },
    FirstUpdate { snapshot: DeltaMap, ignore_list: Vec<String> },
    LoginResult { ok: bool },
}
