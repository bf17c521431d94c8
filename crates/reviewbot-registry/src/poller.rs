//! Registry Index Poller (C1): `since/<cursor>` decoding.

use crate::error::PollError;
use reviewbot_core::{PackageName, TransportError, Version};
use tracing::debug;

/// Polls `package.elm-lang.org`'s incremental package index.
#[derive(Debug, Clone)]
pub struct RegistryIndexPoller {
    client: reqwest::Client,
    registry_base: String,
}

impl RegistryIndexPoller {
    /// `registry_base` is a full base URL, e.g. `https://package.elm-lang.org`.
    #[must_use]
    pub fn new(client: reqwest::Client, registry_base: impl Into<String>) -> Self {
        Self {
            client,
            registry_base: registry_base.into(),
        }
    }

    fn since_url(&self, cursor: u64) -> String {
        format!("{}/all-packages/since/{cursor}", self.registry_base.trim_end_matches('/'))
    }

    /// Fetch every `(name, version)` pair registered since `cursor`, newest
    /// first (the registry returns oldest-first, so the decoded list
    /// is reversed).
    ///
    /// # Errors
    /// Returns `PollError::Transport` on any request/response failure, or
    /// `PollError::MalformedEntry` — rejecting the whole batch — if any
    /// entry doesn't parse as `"<owner>/<repo>@<major>.<minor>.<patch>"`.
    pub async fn poll_since(&self, cursor: u64) -> Result<Vec<(PackageName, Version)>, PollError> {
        let url = self.since_url(cursor);
        debug!(cursor, %url, "polling registry index");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::BadStatus {
                status: response.status().as_u16(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let entries: Vec<String> = sonic_rs::from_str(&body)
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        let mut decoded = Vec::with_capacity(entries.len());
        for entry in entries {
            decoded.push(decode_entry(&entry)?);
        }
        decoded.reverse();
        Ok(decoded)
    }
}

fn decode_entry(raw: &str) -> Result<(PackageName, Version), PollError> {
    let (name_part, version_part) = raw.rsplit_once('@').ok_or_else(|| PollError::MalformedEntry {
        raw: raw.to_string(),
        reason: "expected '<owner>/<repo>@<version>'".to_string(),
    })?;
    let name = PackageName::parse(name_part).map_err(|e| PollError::MalformedEntry {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;
    let version: Version = version_part.parse().map_err(|_| PollError::MalformedEntry {
        raw: raw.to_string(),
        reason: format!("invalid version '{version_part}'"),
    })?;
    Ok((name, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_name_and_version() {
        let (name, version) = decode_entry("rtfeldman/elm-css@1.0.0").unwrap();
        assert_eq!(name.full_name(), "rtfeldman/elm-css");
        assert_eq!(version, Version::new(1, 0, 0));
    }

    #[test]
    fn rejects_missing_at_sign() {
        assert!(decode_entry("rtfeldman/elm-css-1.0.0").is_err());
    }

    #[test]
    fn rejects_malformed_version() {
        assert!(decode_entry("rtfeldman/elm-css@1.0").is_err());
    }

    #[test]
    fn since_url_is_cursor_shaped() {
        let poller = RegistryIndexPoller::new(reqwest::Client::new(), "https://package.elm-lang.org");
        assert_eq!(
            poller.since_url(42),
            "https://package.elm-lang.org/all-packages/since/42"
        );
    }
}
