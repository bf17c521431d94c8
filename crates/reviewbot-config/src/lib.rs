//! Environment-sourced configuration.
//!
//! The system has no configuration file layer: every value is either a
//! built-in default or an environment variable. This mirrors the two
//! outermost tiers of a full hierarchical loader without the file-reading
//! machinery a CLI package manager needs and a long-running crawler doesn't.

mod error;
mod pr_guard;

pub use error::{ConfigError, Result};
pub use pr_guard::PrGuardMode;

use reviewbot_core::PackageName;
use std::env;
use std::time::Duration;

/// Where a configuration value ultimately came from, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default.
    Defaults,
    /// `REVIEWBOT_*` environment variable.
    Environment,
}

/// The default poll period for the registry index poller.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// The scheduler's pacing delay between dispatches.
pub const SCHEDULER_PACING_DELAY: Duration = Duration::from_millis(200);

/// The per-request timeout for registry metadata calls.
pub const METADATA_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the hosting-platform API. Never logged.
    pub hosting_token: String,
    /// Shared secret operators authenticate with. Never logged.
    pub operator_secret: String,
    /// The cursor baseline the registry index poller replays from on reset.
    pub package_count_offset: u64,
    /// Package names that are never analyzed, regardless of cache state.
    pub ignore_list: Vec<PackageName>,
    /// How often the poll loop calls the registry index endpoint.
    pub poll_interval: Duration,
    /// Resolves the open question about the PR guard.
    pub pr_guard_mode: PrGuardMode,
    /// Address the operator console's websocket server binds to.
    pub bind_address: String,
    /// Registry base URL (scheme included), overridable so integration
    /// tests can point it at a local mock server instead of
    /// `https://package.elm-lang.org`.
    pub registry_host: String,
    /// Hosting-platform archive base URL, same override rationale.
    pub archive_host: String,
    /// Hosting-platform REST API base URL, same override rationale.
    pub hosting_api_host: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingRequired` if `REVIEWBOT_HOSTING_TOKEN` or
    /// `REVIEWBOT_OPERATOR_SECRET` is unset, or `ConfigError::Invalid` if a
    /// present value fails to parse.
    pub fn from_env() -> Result<Self> {
        let hosting_token = require_env("REVIEWBOT_HOSTING_TOKEN")?;
        let operator_secret = require_env("REVIEWBOT_OPERATOR_SECRET")?;

        let package_count_offset = match env::var("REVIEWBOT_PACKAGE_COUNT_OFFSET") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "REVIEWBOT_PACKAGE_COUNT_OFFSET",
                reason: "expected a non-negative integer".to_string(),
            })?,
            Err(_) => 0,
        };

        let ignore_list = match env::var("REVIEWBOT_IGNORE_LIST") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    PackageName::parse(s).map_err(|_| ConfigError::Invalid {
                        var: "REVIEWBOT_IGNORE_LIST",
                        reason: format!("'{s}' is not a valid '<owner>/<repo>' name"),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let poll_interval = match env::var("REVIEWBOT_POLL_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid {
                    var: "REVIEWBOT_POLL_INTERVAL_SECS",
                    reason: "expected a non-negative integer".to_string(),
                }
            })?),
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        let pr_guard_mode = match env::var("REVIEWBOT_PR_GUARD_MODE") {
            Ok(raw) => PrGuardMode::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "REVIEWBOT_PR_GUARD_MODE",
                reason: "expected 'annotate' or 'enforce'".to_string(),
            })?,
            Err(_) => PrGuardMode::Annotate,
        };

        let bind_address =
            env::var("REVIEWBOT_BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8787".to_string());

        let registry_host = env::var("REVIEWBOT_REGISTRY_HOST")
            .unwrap_or_else(|_| "https://package.elm-lang.org".to_string());
        let archive_host =
            env::var("REVIEWBOT_ARCHIVE_HOST").unwrap_or_else(|_| "https://github.com".to_string());
        let hosting_api_host = env::var("REVIEWBOT_HOSTING_API_HOST")
            .unwrap_or_else(|_| "https://api.github.com".to_string());

        Ok(Self {
            hosting_token,
            operator_secret,
            package_count_offset,
            ignore_list,
            poll_interval,
            pr_guard_mode,
            bind_address,
            registry_host,
            archive_host,
            hosting_api_host,
        })
    }
}

fn require_env(var: &'static str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingRequired { var }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for var in [
            "REVIEWBOT_HOSTING_TOKEN",
            "REVIEWBOT_OPERATOR_SECRET",
            "REVIEWBOT_PACKAGE_COUNT_OFFSET",
            "REVIEWBOT_IGNORE_LIST",
            "REVIEWBOT_POLL_INTERVAL_SECS",
            "REVIEWBOT_PR_GUARD_MODE",
            "REVIEWBOT_BIND_ADDRESS",
        ] {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn fails_without_required_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { var: "REVIEWBOT_HOSTING_TOKEN" }));
    }

    #[test]
    fn applies_defaults_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe {
            env::set_var("REVIEWBOT_HOSTING_TOKEN", "tok");
            env::set_var("REVIEWBOT_OPERATOR_SECRET", "sec");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.package_count_offset, 0);
        assert!(config.ignore_list.is_empty());
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        clear_all();
    }

    #[test]
    fn parses_ignore_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        unsafe {
            env::set_var("REVIEWBOT_HOSTING_TOKEN", "tok");
            env::set_var("REVIEWBOT_OPERATOR_SECRET", "sec");
            env::set_var("REVIEWBOT_IGNORE_LIST", "elm/core, rtfeldman/elm-css");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.ignore_list.len(), 2);
        clear_all();
    }
}
