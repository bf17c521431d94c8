//! Error types shared by the core data model.

use thiserror::Error;

/// Errors that can occur while parsing or constructing core types.
///
/// These never represent a pipeline failure on their own: every callsite
/// that can hit one of these folds it into a per-package outcome
/// (`FetchMetaFailed`, `ReviewOutcome::TransportError`, or a `RunResult`
/// variant) rather than propagating it to an unrelated package.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A registry-supplied name did not split into `owner/repo`.
    #[error("invalid package name '{raw}': expected '<owner>/<repo>'")]
    InvalidPackageName {
        /// The raw string that failed to parse.
        raw: String,
    },

    /// A version string was not three non-negative integers separated by dots.
    #[error("invalid version string '{raw}'")]
    InvalidVersion {
        /// The raw string that failed to parse.
        raw: String,
    },

    /// A version constraint did not match the `MIN <= v < MAX` grammar.
    #[error("invalid version constraint '{raw}': {reason}")]
    InvalidConstraint {
        /// The raw string that failed to parse.
        raw: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The manifest declared `"type": "application"` rather than `"package"`.
    #[error("manifest is application-typed, not library-typed")]
    NotLibraryManifest,

    /// The manifest JSON did not parse or was missing required fields.
    #[error("malformed manifest JSON: {0}")]
    MalformedManifest(String),

    /// The module-documentation JSON did not parse.
    #[error("malformed module documentation JSON: {0}")]
    MalformedDocs(String),
}

/// Convenience alias for results in this crate and its dependents.
pub type Result<T> = std::result::Result<T, CoreError>;

/// A transport-layer failure talking to the registry or the hosting
/// platform. Carried verbatim inside outcome payloads (`ReviewOutcome`,
/// `PackageRecord::FetchMetaFailed`, `PackageRecord::PRFailed`) — it is never
/// promoted to a process abort.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,
    /// The server responded with a non-2xx status.
    #[error("unexpected status {status}")]
    BadStatus {
        /// The HTTP status code.
        status: u16,
    },
    /// The resource did not exist (HTTP 404).
    #[error("resource not found")]
    NotFound,
    /// A lower-level network failure (DNS, connection reset, TLS, ...).
    #[error("network error: {0}")]
    Network(String),
    /// The response body did not parse as the expected shape.
    #[error("response parse error: {0}")]
    Parse(String),
}
