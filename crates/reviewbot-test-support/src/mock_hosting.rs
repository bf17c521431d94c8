//! Mock servers for the two hosting-platform surfaces the system talks to:
//! tag-based archive downloads, and the git data REST API used to open
//! pull requests.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock archive host, serving tag-shaped zip downloads.
#[derive(Debug)]
pub struct MockArchiveHost {
    server: MockServer,
}

impl MockArchiveHost {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Register the archive for `<owner>/<repo>` at tag `v<version>`.
    pub async fn register_archive(&self, owner: &str, repo: &str, version: &str, zip_bytes: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(format!("/{owner}/{repo}/archive/refs/tags/v{version}.zip")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_bytes))
            .mount(&self.server)
            .await;
    }

    /// Register a 404 for `<owner>/<repo>` at tag `v<version>`, simulating a
    /// release that was never tagged.
    pub async fn register_tag_not_found(&self, owner: &str, repo: &str, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{owner}/{repo}/archive/refs/tags/v{version}.zip")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }
}

/// Mock hosting-platform REST API, covering the git-data endpoints the
/// pull-request orchestrator drives end to end.
#[derive(Debug)]
pub struct MockHostingApi {
    server: MockServer,
}

impl MockHostingApi {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub async fn register_repository(&self, owner: &str, repo: &str, default_branch: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "default_branch": default_branch,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_branch_head(&self, owner: &str, repo: &str, branch: &str, sha: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": { "sha": sha }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_tag(&self, owner: &str, repo: &str, tag: &str, sha: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}/git/refs/tags/{tag}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": { "sha": sha }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_commit(&self, owner: &str, repo: &str, sha: &str, tree_sha: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}/git/commits/{sha}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha,
                "tree": { "sha": tree_sha }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_create_tree(&self, owner: &str, repo: &str, sha: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/repos/{owner}/{repo}/git/trees")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_create_commit(&self, owner: &str, repo: &str, sha: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/repos/{owner}/{repo}/git/commits")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_update_ref(&self, owner: &str, repo: &str, branch: &str) {
        Mock::given(method("PATCH"))
            .and(path(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.server)
            .await;
    }

    /// Fail the first `update_ref` call with a 422, then succeed on every
    /// call after — for exercising the operator-retry path after a
    /// `PrFailed` stage failure.
    pub async fn register_update_ref_failing_once(&self, owner: &str, repo: &str, branch: &str) {
        Mock::given(method("PATCH"))
            .and(path(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}")))
            .respond_with(ResponseTemplate::new(422))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    pub async fn register_fork(&self, owner: &str, repo: &str, fork_owner: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/repos/{owner}/{repo}/forks")))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "owner": { "login": fork_owner },
                "name": repo,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn register_open_pull_request(&self, owner: &str, repo: &str, html_url: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/repos/{owner}/{repo}/pulls")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "html_url": html_url })))
            .mount(&self.server)
            .await;
    }
}
