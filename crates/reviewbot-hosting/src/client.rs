//! A thin typed wrapper over the hosting platform's git data API.

use crate::error::HostingError;
use reviewbot_core::TransportError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Authenticated client for the hosting platform's REST API.
#[derive(Debug, Clone)]
pub struct HostingClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryInfo {
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct RefResponse {
    pub object: RefObject,
}

#[derive(Debug, Deserialize)]
pub struct RefObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitResponse {
    pub sha: String,
    pub tree: TreeRef,
}

#[derive(Debug, Deserialize)]
pub struct TreeRef {
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct TreeEntry<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTreeBody<'a> {
    tree: Vec<TreeEntry<'a>>,
    base_tree: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateTreeResponse {
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommitResponse {
    pub sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ForkResponse {
    pub owner: ForkOwner,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ForkOwner {
    pub login: String,
}

#[derive(Debug, Serialize)]
struct OpenPullBody<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PullResponse {
    pub html_url: String,
}

impl HostingClient {
    /// `api_base` is a full base URL, e.g. `https://api.github.com`.
    #[must_use]
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.trim_end_matches('/'))
    }

    async fn send<T: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<R, HostingError> {
        let url = self.url(path);
        debug!(%method, %url, "hosting API request");

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", "reviewbot");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| TransportError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound.into());
        }
        if !response.status().is_success() {
            return Err(TransportError::BadStatus {
                status: response.status().as_u16(),
            }
            .into());
        }

        let text = response.text().await.map_err(|e| TransportError::Network(e.to_string()))?;
        sonic_rs::from_str(&text).map_err(|e| HostingError::UnexpectedShape(e.to_string()))
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo, HostingError> {
        self.send(reqwest::Method::GET, &format!("repos/{owner}/{repo}"), None::<&()>).await
    }

    pub async fn get_branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<RefResponse, HostingError> {
        self.send(
            reqwest::Method::GET,
            &format!("repos/{owner}/{repo}/git/refs/heads/{branch}"),
            None::<&()>,
        )
        .await
    }

    pub async fn get_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<RefResponse, HostingError> {
        self.send(
            reqwest::Method::GET,
            &format!("repos/{owner}/{repo}/git/refs/tags/{tag}"),
            None::<&()>,
        )
        .await
    }

    pub async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitResponse, HostingError> {
        self.send(
            reqwest::Method::GET,
            &format!("repos/{owner}/{repo}/git/commits/{sha}"),
            None::<&()>,
        )
        .await
    }

    pub async fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        base_tree: &str,
        path: &str,
        content: &str,
    ) -> Result<CreateTreeResponse, HostingError> {
        let body = CreateTreeBody {
            tree: vec![TreeEntry {
                path,
                mode: "100644",
                kind: "blob",
                content,
            }],
            base_tree,
        };
        self.send(reqwest::Method::POST, &format!("repos/{owner}/{repo}/git/trees"), Some(&body))
            .await
    }

    pub async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        tree: &str,
        parent: &str,
    ) -> Result<CreateCommitResponse, HostingError> {
        let body = CreateCommitBody {
            message,
            tree,
            parents: vec![parent],
        };
        self.send(reqwest::Method::POST, &format!("repos/{owner}/{repo}/git/commits"), Some(&body))
            .await
    }

    pub async fn update_ref(&self, owner: &str, repo: &str, branch: &str, sha: &str) -> Result<(), HostingError> {
        let body = UpdateRefBody { sha, force: false };
        let _: serde::de::IgnoredAny = self
            .send(
                reqwest::Method::PATCH,
                &format!("repos/{owner}/{repo}/git/refs/heads/{branch}"),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    pub async fn create_fork(&self, owner: &str, repo: &str) -> Result<ForkResponse, HostingError> {
        self.send(reqwest::Method::POST, &format!("repos/{owner}/{repo}/forks"), None::<&()>)
            .await
    }

    pub async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<PullResponse, HostingError> {
        let request_body = OpenPullBody { title, head, base, body };
        self.send(reqwest::Method::POST, &format!("repos/{owner}/{repo}/pulls"), Some(&request_body))
            .await
    }
}
