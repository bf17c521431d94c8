//! Metadata Fetcher (C3): manifest + doc-summary, both required.

use reviewbot_core::{ManifestKind, ModuleDoc, PackageManifest, PackageName, TransportError, Version};
use tracing::debug;

/// Fetches and validates a package's manifest and module documentation.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: reqwest::Client,
    registry_base: String,
}

impl MetadataFetcher {
    /// `registry_base` is a full base URL, e.g. `https://package.elm-lang.org`.
    #[must_use]
    pub fn new(client: reqwest::Client, registry_base: impl Into<String>) -> Self {
        Self {
            client,
            registry_base: registry_base.into(),
        }
    }

    fn manifest_url(&self, name: &PackageName, version: &Version) -> String {
        format!(
            "{}/packages/{}/{}/{version}/elm.json",
            self.registry_base.trim_end_matches('/'),
            name.owner,
            name.repo,
        )
    }

    fn docs_url(&self, name: &PackageName, version: &Version) -> String {
        format!(
            "{}/packages/{}/{}/{version}/docs.json",
            self.registry_base.trim_end_matches('/'),
            name.owner,
            name.repo,
        )
    }

    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
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
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    /// Fetch both the manifest and docs for `(name, version)`. Succeeds iff
    /// both payloads parse and the manifest is library-typed; any
    /// other outcome collapses to a single `TransportError`, the shape
    /// `PackageRecord::FetchMetaFailed` carries.
    pub async fn fetch(&self, name: &PackageName, version: &Version) -> Result<(PackageManifest, Vec<ModuleDoc>), TransportError> {
        debug!(package = %name, %version, "fetching manifest and docs");

        let manifest_text = self.get_text(&self.manifest_url(name, version)).await?;
        let kind = PackageManifest::peek_kind(&manifest_text).map_err(|e| TransportError::Parse(e.to_string()))?;
        if kind != ManifestKind::Library {
            return Err(TransportError::Parse("manifest is application-typed, not library-typed".to_string()));
        }
        let manifest = PackageManifest::parse(&manifest_text).map_err(|e| TransportError::Parse(e.to_string()))?;

        let docs_text = self.get_text(&self.docs_url(name, version)).await?;
        let docs = ModuleDoc::parse_all(&docs_text).map_err(|e| TransportError::Parse(e.to_string()))?;

        Ok((manifest, docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_and_docs_urls_are_version_rooted() {
        let fetcher = MetadataFetcher::new(reqwest::Client::new(), "https://package.elm-lang.org");
        let name = PackageName::parse("rtfeldman/elm-css").unwrap();
        let version = Version::new(1, 0, 0);
        assert_eq!(
            fetcher.manifest_url(&name, &version),
            "https://package.elm-lang.org/packages/rtfeldman/elm-css/1.0.0/elm.json"
        );
        assert_eq!(
            fetcher.docs_url(&name, &version),
            "https://package.elm-lang.org/packages/rtfeldman/elm-css/1.0.0/docs.json"
        );
    }
}
