//! Mapping between the archive/analysis/hosting crates' outcome taxonomies
//! and the cache's `ReviewOutcome`/`TransportError` shapes.

use reviewbot_analysis::{ReviewOutcome, RunResult};
use reviewbot_archive::AssembleOutcome;
use reviewbot_core::TransportError;
use reviewbot_hosting::HostingError;

/// Classify an archive-retrieval failure: a 404 is `TagNotFound`,
/// anything else is a plain `TransportError`.
#[must_use]
pub fn archive_retrieval_failure(error: TransportError) -> ReviewOutcome {
    match error {
        TransportError::NotFound => ReviewOutcome::TagNotFound,
        other => ReviewOutcome::TransportError(other),
    }
}

/// Classify what the assembler produced short of a full analysis run.
#[must_use]
pub fn assemble_outcome_to_review_outcome(outcome: AssembleOutcome) -> ReviewOutcome {
    match outcome {
        AssembleOutcome::NotAnEligiblePackage => ReviewOutcome::RuleRun(RunResult::NotAnEligiblePackage),
        AssembleOutcome::MissingDependencies(missing) => {
            ReviewOutcome::RuleRun(RunResult::MissingDependencies(missing))
        }
        AssembleOutcome::Assembled(_) => {
            unreachable!("callers handle Assembled by invoking the analysis driver directly")
        }
    }
}

/// Fold a `HostingError` down to the `TransportError` shape
/// `PackageRecord::PrFailed` carries.
#[must_use]
pub fn hosting_error_to_transport(error: HostingError) -> TransportError {
    match error {
        HostingError::Transport(t) => t,
        HostingError::UnexpectedShape(reason) => TransportError::Parse(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_archive_failure_is_tag_not_found() {
        assert_eq!(archive_retrieval_failure(TransportError::NotFound), ReviewOutcome::TagNotFound);
    }

    #[test]
    fn other_archive_failure_is_transport_error() {
        let err = TransportError::BadStatus { status: 500 };
        assert_eq!(
            archive_retrieval_failure(err.clone()),
            ReviewOutcome::TransportError(err)
        );
    }

    #[test]
    fn unexpected_shape_folds_to_parse() {
        let mapped = hosting_error_to_transport(HostingError::UnexpectedShape("bad".to_string()));
        assert_eq!(mapped, TransportError::Parse("bad".to_string()));
    }
}
