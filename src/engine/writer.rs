//! Writes a single commit onto a freshly created branch.
use log::*;

use crate::{
    CaretakerError, Result,
    forge::{
        request::{CreateCommitRequest, CreateTreeRequest, RepoId},
        traits::GitHost,
    },
};

#[derive(Debug, Clone)]
/// Request to put one new commit on a new branch.
pub struct WriteRequest {
    pub base_branch: String,
    pub branch: String,
    /// Commit the branch starts from and the new commit's only parent
    pub base_commit_sha: String,
    pub tree: CreateTreeRequest,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenCommit {
    pub tree_sha: String,
    pub commit_sha: String,
}

pub struct CommitWriter<'a> {
    host: &'a dyn GitHost,
    repo: &'a RepoId,
}

impl<'a> CommitWriter<'a> {
    pub fn new(host: &'a dyn GitHost, repo: &'a RepoId) -> Self {
        Self { host, repo }
    }

    /// Branch, tree, commit and ref update in one call.
    pub async fn write(&self, req: WriteRequest) -> Result<WrittenCommit> {
        self.create_branch(&req).await?;
        self.commit(req).await
    }

    /// Create the branch at the base commit. This happens before any object
    /// is written, so a failure further along leaves an inspectable branch
    /// rather than dangling objects. Nothing is rolled back.
    pub async fn create_branch(&self, req: &WriteRequest) -> Result<()> {
        info!(
            "creating branch {} from {} at {} in {}",
            req.branch, req.base_branch, req.base_commit_sha, self.repo
        );

        self.host
            .create_ref(self.repo, &req.branch, &req.base_commit_sha)
            .await
            .map_err(|e| CaretakerError::BranchCreationFailed {
                owner: self.repo.owner.clone(),
                repo: self.repo.repo.clone(),
                branch: req.branch.clone(),
                reason: e.to_string(),
            })
    }

    /// Write the tree and a single-parent commit, then move the branch
    /// created by [`Self::create_branch`] onto it.
    pub async fn commit(&self, req: WriteRequest) -> Result<WrittenCommit> {
        let tree_sha = self
            .host
            .create_tree(self.repo, req.tree)
            .await
            .map_err(|e| self.write_failed(&req.branch, "create tree", e))?;

        let commit_sha = self
            .host
            .create_commit(
                self.repo,
                CreateCommitRequest {
                    message: req.message.clone(),
                    tree: tree_sha.clone(),
                    parents: vec![req.base_commit_sha.clone()],
                },
            )
            .await
            .map_err(|e| self.write_failed(&req.branch, "create commit", e))?;

        info!("created commit for branch {}: sha: {commit_sha}", req.branch);

        self.host
            .update_ref(self.repo, &req.branch, &commit_sha)
            .await
            .map_err(|e| self.write_failed(&req.branch, "update ref", e))?;

        Ok(WrittenCommit {
            tree_sha,
            commit_sha,
        })
    }

    fn write_failed(
        &self,
        branch: &str,
        operation: &str,
        err: CaretakerError,
    ) -> CaretakerError {
        CaretakerError::CommitWriteFailed {
            owner: self.repo.owner.clone(),
            repo: self.repo.repo.clone(),
            branch: branch.to_string(),
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}
