//! Archive Retriever (C5): fetch the source archive for a chosen
//! (name, version) from the hosting platform.

use reviewbot_core::{PackageName, TransportError, Version};
use tracing::debug;

/// Retrieves package source archives from the hosting platform's tag-based
/// archive URLs.
#[derive(Debug, Clone)]
pub struct ArchiveRetriever {
    client: reqwest::Client,
    archive_base: String,
}

impl ArchiveRetriever {
    /// `archive_base` is a full base URL, e.g. `https://github.com`.
    #[must_use]
    pub fn new(client: reqwest::Client, archive_base: impl Into<String>) -> Self {
        Self {
            client,
            archive_base: archive_base.into(),
        }
    }

    fn archive_url(&self, name: &PackageName, version: &Version) -> String {
        format!(
            "{}/{}/{}/archive/refs/tags/v{version}.zip",
            self.archive_base.trim_end_matches('/'),
            name.owner,
            name.repo,
        )
    }

    /// Retrieve the archive bytes at `v<major>.<minor>.<patch>` for `name`.
    ///
    /// # Errors
    /// Returns `TransportError::NotFound` on a 404 response (the record
    /// transitions to `TagNotFound`, distinguished from other transport
    /// errors by the caller), or any other `TransportError` variant on
    /// timeout/network/bad-status failures.
    pub async fn retrieve(&self, name: &PackageName, version: &Version) -> Result<Vec<u8>, TransportError> {
        let url = self.archive_url(name, version);
        debug!(package = %name, %version, %url, "fetching archive");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound);
        }
        if !response.status().is_success() {
            return Err(TransportError::BadStatus {
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_url_uses_tag_shaped_path() {
        let retriever = ArchiveRetriever::new(reqwest::Client::new(), "https://github.com");
        let url = retriever.archive_url(&PackageName::parse("rtfeldman/elm-css").unwrap(), &Version::new(1, 0, 0));
        assert_eq!(url, "https://github.com/rtfeldman/elm-css/archive/refs/tags/v1.0.0.zip");
    }
}
