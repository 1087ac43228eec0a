//! Host wrapper that performs reads but only logs writes
use async_trait::async_trait;
use log::*;

use crate::{
    Result,
    forge::{
        request::{
            CreateCommitRequest, CreatePrRequest, CreateTreeRequest,
            GitCommit, PullRequest, RemoteFile, RemoteTreeEntry, RepoId,
        },
        traits::GitHost,
    },
};

/// Placeholder sha returned for objects that were never written.
pub const DRY_RUN_SHA: &str = "fff";

pub struct DryRunHost {
    host: Box<dyn GitHost>,
}

impl DryRunHost {
    pub fn new(host: Box<dyn GitHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl GitHost for DryRunHost {
    async fn get_branch_sha(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<String> {
        self.host.get_branch_sha(repo, branch).await
    }

    async fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<GitCommit> {
        self.host.get_commit(repo, sha).await
    }

    async fn get_file(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<RemoteFile> {
        self.host.get_file(repo, path, git_ref).await
    }

    async fn get_tree_recursive(
        &self,
        repo: &RepoId,
        tree_sha: &str,
    ) -> Result<Vec<RemoteTreeEntry>> {
        self.host.get_tree_recursive(repo, tree_sha).await
    }

    async fn create_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        warn!("dry_run: would create branch {branch} at {sha} in {repo}");
        Ok(())
    }

    async fn create_tree(
        &self,
        repo: &RepoId,
        req: CreateTreeRequest,
    ) -> Result<String> {
        warn!("dry_run: would create tree in {repo}: req: {:#?}", req);
        Ok(DRY_RUN_SHA.into())
    }

    async fn create_commit(
        &self,
        repo: &RepoId,
        req: CreateCommitRequest,
    ) -> Result<String> {
        warn!("dry_run: would create commit in {repo}: req: {:#?}", req);
        Ok(DRY_RUN_SHA.into())
    }

    async fn update_ref(
        &self,
        repo: &RepoId,
        branch: &str,
        sha: &str,
    ) -> Result<()> {
        warn!("dry_run: would move branch {branch} to {sha} in {repo}");
        Ok(())
    }

    async fn create_pr(
        &self,
        repo: &RepoId,
        req: CreatePrRequest,
    ) -> Result<PullRequest> {
        warn!("dry_run: would create PR in {repo}: req: {:#?}", req);
        Ok(PullRequest {
            number: 0,
            node_id: "".into(),
        })
    }

    async fn enable_auto_merge(&self, pr_node_id: &str) -> Result<()> {
        warn!("dry_run: would enable auto-merge for PR node {pr_node_id:?}");
        Ok(())
    }
}
