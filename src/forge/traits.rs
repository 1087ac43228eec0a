//! Traits related to remote git hosts
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::request::{
        CreateCommitRequest, CreatePrRequest, CreateTreeRequest, GitCommit,
        PullRequest, RemoteFile, RemoteTreeEntry, RepoId,
    },
};

/// The Git Data API surface the migration engine is built on. Every call
/// is a suspension point; implementations add no retries or timeouts of
/// their own beyond what the transport enforces.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Resolve `refs/heads/<branch>` to the commit sha it points at.
    async fn get_branch_sha(&self, repo: &RepoId, branch: &str)
    -> Result<String>;

    /// Fetch a commit and its root tree sha.
    async fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<GitCommit>;

    /// Fetch a file at `git_ref`. Fails with `CaretakerError::NotFound` when
    /// the path does not exist there.
    async fn get_file(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<RemoteFile>;

    /// Full recursive listing of a tree.
    async fn get_tree_recursive(
        &self,
        repo: &RepoId,
        tree_sha: &str,
    ) -> Result<Vec<RemoteTreeEntry>>;

    /// Create `refs/heads/<branch>` pointing at `sha`.
    async fn create_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()>;

    /// Create a tree object and return its sha.
    async fn create_tree(
        &self,
        repo: &RepoId,
        req: CreateTreeRequest,
    ) -> Result<String>;

    /// Create a commit object and return its sha.
    async fn create_commit(
        &self,
        repo: &RepoId,
        req: CreateCommitRequest,
    ) -> Result<String>;

    /// Move an existing `refs/heads/<branch>` to `sha`.
    async fn update_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()>;

    async fn create_pr(
        &self,
        repo: &RepoId,
        req: CreatePrRequest,
    ) -> Result<PullRequest>;

    /// Enable squash auto-merge for the pull request with the given node id.
    async fn enable_auto_merge(&self, pr_node_id: &str) -> Result<()>;
}
