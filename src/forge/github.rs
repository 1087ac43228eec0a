//! Implements the GitHost trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::{Octocrab, models::repos::Object, params::repos::Reference};

mod graphql;
mod types;

use crate::{
    CaretakerError, Result,
    forge::{
        config::RemoteConfig,
        github::{
            graphql::{
                AUTO_MERGE_METHOD, ENABLE_AUTO_MERGE_MUTATION,
                EnableAutoMergeData, EnableAutoMergeVariables,
                GraphqlResponse,
            },
            types::{
                FILE_CONTENT_TYPE, GithubCommit, GithubTreeListing, Tree,
            },
        },
        request::{
            Commit, CreateCommitRequest, CreatePrRequest, CreateTreeRequest,
            GitCommit, PullRequest, RemoteFile, RemoteTreeEntry, RepoId,
        },
        traits::GitHost,
    },
};

/// GitHub host implementation using Octocrab for the REST Git Data API and
/// the GraphQL auto-merge mutation.
pub struct Github {
    instance: Octocrab,
}

impl Github {
    /// Create GitHub client with token authentication and API base URL
    /// configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_uri = config.api_base_uri();
        let instance = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(base_uri)?
            .build()?;

        Ok(Self { instance })
    }

    fn git_route(repo: &RepoId, rest: &str) -> String {
        format!("/repos/{}/{}/git/{rest}", repo.owner, repo.repo)
    }
}

#[async_trait]
impl GitHost for Github {
    async fn get_branch_sha(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<String> {
        let branch_ref = self
            .instance
            .repos(&repo.owner, &repo.repo)
            .get_ref(&Reference::Branch(branch.to_string()))
            .await?;

        match branch_ref.object {
            Object::Commit { sha, .. } => Ok(sha),
            _ => Err(CaretakerError::forge(format!(
                "branch {branch} in {repo} does not point at a commit"
            ))),
        }
    }

    async fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<GitCommit> {
        let route = Self::git_route(repo, &format!("commits/{sha}"));
        let commit: GithubCommit = self.instance.get(route, None::<&()>).await?;

        Ok(GitCommit {
            sha: commit.sha,
            tree_sha: commit.tree.sha,
        })
    }

    async fn get_file(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<RemoteFile> {
        let mut data = self
            .instance
            .repos(&repo.owner, &repo.repo)
            .get_content()
            .path(path)
            .r#ref(git_ref)
            .send()
            .await?;

        let mut items = data.take_items();

        if items.is_empty() {
            return Err(CaretakerError::not_found(path));
        }

        if items.len() > 1 || items[0].r#type != FILE_CONTENT_TYPE {
            return Err(CaretakerError::forge(format!(
                "path {path} in {repo} is not a file"
            )));
        }

        let item = items.remove(0);

        let content_base64 = item.content.ok_or_else(|| {
            CaretakerError::forge(format!(
                "no inline content returned for {path} in {repo}"
            ))
        })?;

        Ok(RemoteFile {
            sha: item.sha,
            content_base64,
        })
    }

    async fn get_tree_recursive(
        &self,
        repo: &RepoId,
        tree_sha: &str,
    ) -> Result<Vec<RemoteTreeEntry>> {
        let route =
            Self::git_route(repo, &format!("trees/{tree_sha}?recursive=1"));
        let listing: GithubTreeListing =
            self.instance.get(route, None::<&()>).await?;

        if listing.truncated {
            return Err(CaretakerError::TruncatedTree(listing.sha));
        }

        debug!(
            "listed {} entries for tree {} in {repo}",
            listing.tree.len(),
            listing.sha
        );

        Ok(listing.tree)
    }

    async fn create_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        self.instance
            .repos(&repo.owner, &repo.repo)
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await?;

        Ok(())
    }

    async fn create_tree(
        &self,
        repo: &RepoId,
        req: CreateTreeRequest,
    ) -> Result<String> {
        let route = Self::git_route(repo, "trees");

        match &req.base_tree {
            Some(base) => info!("creating tree starting from: {base}"),
            None => info!("creating complete tree of {} entries", req.tree.len()),
        }

        let tree: Tree = self.instance.post(route, Some(&req)).await?;

        info!("created new tree: {}", tree.sha);

        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoId,
        req: CreateCommitRequest,
    ) -> Result<String> {
        let route = Self::git_route(repo, "commits");
        let commit: Commit = self.instance.post(route, Some(&req)).await?;

        Ok(commit.sha)
    }

    async fn update_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        let route = Self::git_route(repo, &format!("refs/heads/{branch}"));

        let _: serde_json::Value = self
            .instance
            .patch(
                route,
                Some(&serde_json::json!({
                  "sha": sha,
                  "force": false
                })),
            )
            .await?;

        Ok(())
    }

    async fn create_pr(
        &self,
        repo: &RepoId,
        req: CreatePrRequest,
    ) -> Result<PullRequest> {
        let pr = self
            .instance
            .pulls(&repo.owner, &repo.repo)
            .create(req.title, req.head_branch, req.base_branch)
            .body(req.body)
            .send()
            .await?;

        Ok(PullRequest {
            number: pr.number,
            node_id: pr.node_id.unwrap_or_default(),
        })
    }

    async fn enable_auto_merge(&self, pr_node_id: &str) -> Result<()> {
        if pr_node_id.is_empty() {
            return Err(CaretakerError::forge(
                "pull request has no node id to enable auto-merge on",
            ));
        }

        let vars = EnableAutoMergeVariables {
            pull_request_id: pr_node_id.to_string(),
            merge_method: AUTO_MERGE_METHOD.to_string(),
        };

        let json = serde_json::json!({
          "query": ENABLE_AUTO_MERGE_MUTATION,
          "variables": vars,
        });

        let response: GraphqlResponse<EnableAutoMergeData> =
            self.instance.graphql(&json).await?;

        if let Some(msg) = response.error_message() {
            return Err(CaretakerError::forge(msg));
        }

        Ok(())
    }
}
