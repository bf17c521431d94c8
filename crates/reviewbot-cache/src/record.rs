//! `PackageRecord`: one entry per observed (name, version), modeled as a
//! closed tagged union rather than a shared struct with optional fields.

use reviewbot_analysis::{ReviewOutcome, RunResult};
use reviewbot_core::{Diagnostic, ModuleDoc, PackageManifest, TransportError, Version};

/// The payload carried forward once a record has a `FoundErrors` outcome in
/// hand: the PR orchestrator and its retry path both need it, so it's lifted
/// out of `RunResult::FoundErrors` rather than re-matched at every site that
/// needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundErrorsPayload {
    pub errors: Vec<Diagnostic>,
    pub old_manifest_text: String,
    pub new_manifest_text: String,
}

impl FoundErrorsPayload {
    /// Extract a `FoundErrorsPayload` from a `RunResult`, if it's the
    /// `FoundErrors` variant.
    #[must_use]
    pub fn from_run_result(result: &RunResult) -> Option<Self> {
        match result {
            RunResult::FoundErrors {
                errors,
                old_manifest_text,
                new_manifest_text,
            } => Some(Self {
                errors: errors.clone(),
                old_manifest_text: old_manifest_text.clone(),
                new_manifest_text: new_manifest_text.clone(),
            }),
            _ => None,
        }
    }
}

/// A known package-version's lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRecord {
    /// Known to exist; nothing fetched yet.
    Pending { version: Version, insertion_index: u64 },
    /// Metadata in hand; not yet analyzed.
    Fetched {
        version: Version,
        insertion_index: u64,
        manifest: PackageManifest,
        docs: Vec<ModuleDoc>,
    },
    /// Analyzed; outcome recorded.
    FetchedAndChecked {
        version: Version,
        insertion_index: u64,
        manifest: PackageManifest,
        docs: Vec<ModuleDoc>,
        outcome: ReviewOutcome,
    },
    /// Operator requested a PR; async issuance in flight.
    PrPending {
        version: Version,
        insertion_index: u64,
        manifest: PackageManifest,
        docs: Vec<ModuleDoc>,
        found_errors: FoundErrorsPayload,
    },
    /// PR successfully opened.
    PrSent {
        version: Version,
        insertion_index: u64,
        manifest: PackageManifest,
        docs: Vec<ModuleDoc>,
        found_errors: FoundErrorsPayload,
        url: String,
    },
    /// PR attempt failed at a named stage.
    PrFailed {
        version: Version,
        insertion_index: u64,
        manifest: PackageManifest,
        docs: Vec<ModuleDoc>,
        found_errors: FoundErrorsPayload,
        stage: String,
        error: TransportError,
    },
    /// Metadata fetch failed terminally.
    FetchMetaFailed {
        version: Version,
        insertion_index: u64,
        error: TransportError,
    },
}

impl PackageRecord {
    #[must_use]
    pub fn version(&self) -> &Version {
        match self {
            Self::Pending { version, .. }
            | Self::Fetched { version, .. }
            | Self::FetchedAndChecked { version, .. }
            | Self::PrPending { version, .. }
            | Self::PrSent { version, .. }
            | Self::PrFailed { version, .. }
            | Self::FetchMetaFailed { version, .. } => version,
        }
    }

    #[must_use]
    pub fn insertion_index(&self) -> u64 {
        match self {
            Self::Pending { insertion_index, .. }
            | Self::Fetched { insertion_index, .. }
            | Self::FetchedAndChecked { insertion_index, .. }
            | Self::PrPending { insertion_index, .. }
            | Self::PrSent { insertion_index, .. }
            | Self::PrFailed { insertion_index, .. }
            | Self::FetchMetaFailed { insertion_index, .. } => *insertion_index,
        }
    }

    /// The manifest and docs, if this record has reached a state where they
    /// were fetched successfully. Used by dependency resolution, which may
    /// draw on a dependency in any state except `Pending` and
    /// `FetchMetaFailed`.
    #[must_use]
    pub fn manifest_and_docs(&self) -> Option<(&PackageManifest, &[ModuleDoc])> {
        match self {
            Self::Pending { .. } | Self::FetchMetaFailed { .. } => None,
            Self::Fetched { manifest, docs, .. }
            | Self::FetchedAndChecked { manifest, docs, .. }
            | Self::PrPending { manifest, docs, .. }
            | Self::PrSent { manifest, docs, .. }
            | Self::PrFailed { manifest, docs, .. } => Some((manifest, docs)),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_errors_payload_extracts_only_from_found_errors_variant() {
        assert!(FoundErrorsPayload::from_run_result(&RunResult::NoErrors).is_none());
        let result = RunResult::FoundErrors {
            errors: vec![],
            old_manifest_text: "old".to_string(),
            new_manifest_text: "new".to_string(),
        };
        let payload = FoundErrorsPayload::from_run_result(&result).unwrap();
        assert_eq!(payload.old_manifest_text, "old");
        assert_eq!(payload.new_manifest_text, "new");
    }
}
