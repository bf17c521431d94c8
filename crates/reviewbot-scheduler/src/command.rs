//! Operator commands the scheduler actor accepts.
//!
//! `LoginRequest` never reaches this type — the operator command handler
//! authenticates sessions itself and only forwards commands from sessions
//! that have already logged in.

use reviewbot_core::{PackageName, Version};

/// One command relayed from an authenticated operator session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Discard the entire cache and re-poll from the configured baseline.
    ResetBackend,
    /// Downgrade every analyzed record back to `Fetched`.
    ResetRules,
    /// Open a pull request for the latest known, analyzed version of `name`.
    PullRequestRequest(PackageName),
    /// Re-run analysis for a specific `(name, version)`.
    RerunPackageRequest(PackageName, Version),
}
