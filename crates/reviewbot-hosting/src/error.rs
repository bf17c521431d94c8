//! Hosting-platform client errors.

use reviewbot_core::TransportError;
use thiserror::Error;

/// A single hosting-platform API call's failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostingError {
    /// The request/response transport failed outright.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response body didn't match the expected shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}
