//! Pull-Request Orchestrator (C8): the fork → branch → commit → PR sequence.

use crate::client::HostingClient;
use crate::error::HostingError;
use crate::template::{render_pull_request_body, COMMIT_MESSAGE, PULL_REQUEST_TITLE};
use reviewbot_cache::FoundErrorsPayload;
use reviewbot_analysis::CANONICAL_MANIFEST_PATH;
use reviewbot_core::{PackageName, Version};
use tracing::{info, warn};

/// What the 8-step sequence produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    /// The PR was opened; its URL.
    Sent { url: String },
    /// The sequence failed at a named stage.
    Failed { stage: String, error: HostingError },
}

/// Whether the default-branch head SHA matched the tag SHA for this
/// version — computed for UI labeling only, never gates the sequence
/// (resolved by `reviewbot_config::PrGuardMode::Annotate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagGuardResult {
    pub matches: bool,
}

/// Drives the fork-branch-commit-PR sequence for one package version.
#[derive(Debug, Clone)]
pub struct PullRequestOrchestrator {
    client: HostingClient,
    bot_identity: String,
}

impl PullRequestOrchestrator {
    #[must_use]
    pub fn new(client: HostingClient, bot_identity: impl Into<String>) -> Self {
        Self {
            client,
            bot_identity: bot_identity.into(),
        }
    }

    /// Compute the default-branch/tag-SHA guard without acting on it.
    pub async fn check_tag_guard(&self, name: &PackageName, version: &Version) -> Result<TagGuardResult, HostingError> {
        let repo_info = self.client.get_repository(&name.owner, &name.repo).await?;
        let head = self
            .client
            .get_branch_head(&name.owner, &name.repo, &repo_info.default_branch)
            .await?;
        let tag_name = format!("v{version}");
        let tag = self.client.get_tag(&name.owner, &name.repo, &tag_name).await?;
        Ok(TagGuardResult {
            matches: head.object.sha == tag.object.sha,
        })
    }

    /// Run the full sequence (steps 1-8). Never returns `Err` — every
    /// failure is folded into `PrOutcome::Failed` carrying the stage it
    /// occurred at, matching `PackageRecord::PrFailed`'s shape.
    pub async fn open_pull_request(
        &self,
        name: &PackageName,
        version: &Version,
        found_errors: &FoundErrorsPayload,
    ) -> PrOutcome {
        match self.run(name, version, found_errors).await {
            Ok(url) => PrOutcome::Sent { url },
            Err((stage, error)) => {
                warn!(package = %name, %version, stage, %error, "pull request sequence failed");
                PrOutcome::Failed {
                    stage: stage.to_string(),
                    error,
                }
            }
        }
    }

    async fn run(
        &self,
        name: &PackageName,
        version: &Version,
        found_errors: &FoundErrorsPayload,
    ) -> Result<String, (&'static str, HostingError)> {
        let upstream_owner = name.owner.as_str();
        let upstream_repo = name.repo.as_str();

        // 1. Resolve the upstream default branch.
        let repo_info = self
            .client
            .get_repository(upstream_owner, upstream_repo)
            .await
            .map_err(|e| ("resolve-default-branch", e))?;
        let default_branch = repo_info.default_branch;

        // 2. Fork under the bot's identity.
        let fork = self
            .client
            .create_fork(upstream_owner, upstream_repo)
            .await
            .map_err(|e| ("fork", e))?;
        let fork_owner = fork.owner.login;
        let fork_repo = fork.name;

        // 3. Read the fork's default-branch head commit SHA.
        let head = self
            .client
            .get_branch_head(&fork_owner, &fork_repo, &default_branch)
            .await
            .map_err(|e| ("read-fork-head", e))?;
        let head_sha = head.object.sha;

        // 4. Read that commit's tree SHA.
        let head_commit = self
            .client
            .get_commit(&fork_owner, &fork_repo, &head_sha)
            .await
            .map_err(|e| ("read-head-commit", e))?;

        // 5. Create a new tree with the patched manifest.
        let new_tree = self
            .client
            .create_tree(
                &fork_owner,
                &fork_repo,
                &head_commit.tree.sha,
                CANONICAL_MANIFEST_PATH,
                &found_errors.new_manifest_text,
            )
            .await
            .map_err(|e| ("create-tree", e))?;

        // 6. Commit on the fork.
        let commit = self
            .client
            .create_commit(&fork_owner, &fork_repo, COMMIT_MESSAGE, &new_tree.sha, &head_sha)
            .await
            .map_err(|e| ("create-commit", e))?;

        // 7. Fast-forward the fork's default branch.
        self.client
            .update_ref(&fork_owner, &fork_repo, &default_branch, &commit.sha)
            .await
            .map_err(|e| ("updateBranch", e))?;

        // 8. Open the PR against upstream.
        let head_ref = format!("{fork_owner}:{default_branch}");
        let body = render_pull_request_body(found_errors);
        let pull = self
            .client
            .open_pull_request(upstream_owner, upstream_repo, PULL_REQUEST_TITLE, &head_ref, &default_branch, &body)
            .await
            .map_err(|e| ("open-pull-request", e))?;

        info!(package = %name, %version, bot = %self.bot_identity, url = %pull.html_url, "opened pull request");
        Ok(pull.html_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_guard_equality_is_plain_bool() {
        assert_eq!(TagGuardResult { matches: true }, TagGuardResult { matches: true });
        assert_ne!(TagGuardResult { matches: true }, TagGuardResult { matches: false });
    }
}
