//! Configuration errors.

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was unset or empty.
    #[error("missing required environment variable {var}")]
    MissingRequired {
        /// The variable name.
        var: &'static str,
    },
    /// A present environment variable failed to parse.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ConfigError>;
