//! The pull request's fixed title and templated body.

use reviewbot_cache::FoundErrorsPayload;
use reviewbot_core::PackageManifest;
use std::collections::BTreeSet;

/// The PR title used for every opened pull request.
pub const PULL_REQUEST_TITLE: &str = "Remove unused dependencies";

/// The commit message used for the single commit in the PR.
pub const COMMIT_MESSAGE: &str = "Remove unused dependencies";

/// Whether every dependency removed between the old and new manifest text
/// was test-only, determined by diffing the parsed dependency sets rather
/// than scanning diagnostic message text.
#[must_use]
pub fn removed_dependencies_are_all_test_only(payload: &FoundErrorsPayload) -> bool {
    let Ok(old) = PackageManifest::parse(&payload.old_manifest_text) else {
        return false;
    };
    let Ok(new) = PackageManifest::parse(&payload.new_manifest_text) else {
        return false;
    };

    let removed_direct: BTreeSet<_> = old
        .dependencies
        .keys()
        .filter(|name| !new.dependencies.contains_key(*name))
        .collect();
    let removed_test: BTreeSet<_> = old
        .test_dependencies
        .keys()
        .filter(|name| !new.test_dependencies.contains_key(*name))
        .collect();

    removed_direct.is_empty() && !removed_test.is_empty()
}

/// Render the PR body, parameterized by the error count and whether every
/// removed dependency was test-only.
#[must_use]
pub fn render_pull_request_body(payload: &FoundErrorsPayload) -> String {
    let count = payload.errors.len();
    let plural = count != 1;
    let all_test_only = removed_dependencies_are_all_test_only(payload);

    let headline = if plural {
        format!("`elm-review`'s `NoUnused.Dependencies` rule found {count} unused dependencies.")
    } else {
        "`elm-review`'s `NoUnused.Dependencies` rule found 1 unused dependency.".to_string()
    };

    let release_note = if all_test_only {
        "Since every removed dependency is test-only, this change does not affect consumers and a new release is not required for them to benefit, though publishing one is still encouraged."
    } else {
        "Please publish a new release once this is merged so that consumers can pick up the smaller dependency set."
    };

    format!(
        "{headline}\n\nThis pull request removes {then} from `elm.json`.\n\n{release_note}\n",
        then = if plural { "them" } else { "it" },
    )
}
