//! A mock `package.elm-lang.org` for driving the registry poller and
//! metadata fetcher against real HTTP without touching the network.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock registry index + per-version metadata server.
#[derive(Debug)]
pub struct MockRegistry {
    server: MockServer,
}

impl MockRegistry {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Base URL to hand to `RegistryIndexPoller`/`MetadataFetcher`, e.g.
    /// `http://127.0.0.1:54321`.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Register `since/<cursor>` to return `entries` verbatim (each already
    /// `"<owner>/<repo>@<version>"`, oldest first, as the real index does).
    pub async fn register_since(&self, cursor: u64, entries: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/all-packages/since/{cursor}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(entries)))
            .mount(&self.server)
            .await;
    }

    /// Register a package's `elm.json` and `docs.json` at `<owner>/<repo>/<version>/`.
    pub async fn register_package(&self, owner: &str, repo: &str, version: &str, manifest_json: &str, docs_json: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/packages/{owner}/{repo}/{version}/elm.json")))
            .respond_with(ResponseTemplate::new(200).set_body_string(manifest_json))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/packages/{owner}/{repo}/{version}/docs.json")))
            .respond_with(ResponseTemplate::new(200).set_body_string(docs_json))
            .mount(&self.server)
            .await;
    }

    /// Register a 404 for a package's `elm.json`, simulating a vanished or
    /// never-published version.
    pub async fn register_manifest_not_found(&self, owner: &str, repo: &str, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/packages/{owner}/{repo}/{version}/elm.json")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }
}
