//! Errors surfaced by the registry index poller.
//!
//! The metadata fetcher never needs its own error type — every failure it
//! can produce already has a `TransportError` shape, which is what
//! `PackageRecord::FetchMetaFailed` carries.

use reviewbot_core::TransportError;
use thiserror::Error;

/// A whole poll cycle's worth of failure: a malformed entry rejects the
/// batch rather than being silently dropped.
#[derive(Debug, Error)]
pub enum PollError {
    /// The request to the index endpoint itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// An entry in the index response didn't split into `name@version`, or
    /// its version didn't parse.
    #[error("malformed index entry '{raw}': {reason}")]
    MalformedEntry {
        /// The raw entry string.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },
}
