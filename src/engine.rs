//! Migration engine: turns a change set into one commit on a new branch and
//! an auto-merging pull request, or into nothing at all when the change set
//! matches what the repository already contains.
//!
//! Each invocation runs through
//! `START -> DIFFING -> (NO_OP | BRANCHING -> COMMITTING -> PR_OPENING -> DONE) | ERROR`
//! and holds no state afterwards, so concurrent invocations never share
//! anything but the remote repository itself.
use chrono::Utc;
use log::*;
use std::{collections::HashSet, sync::Arc};
use strum::Display;

use crate::{
    CaretakerError, Result,
    forge::{
        config::DEFAULT_BRANCH_PREFIX,
        request::{GitCommit, RepoId},
        traits::GitHost,
    },
    reporter::ErrorReporter,
};

/// Repository Content Accessor.
pub mod content;

/// Pull Request Publisher.
pub mod publisher;

/// Tree Builder.
pub mod tree;

/// Request, change and result types.
pub mod types;

/// Commit/Branch Writer.
pub mod writer;

use publisher::{PublishRequest, PullRequestPublisher};
use tree::{TreeBuilder, TreePlan};
use types::{ChangedFile, MigrationRequest, MigrationResult, normalize_path};
use writer::{CommitWriter, WriteRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum Stage {
    Diffing,
    NoOp,
    Branching,
    Committing,
    PrOpening,
    Done,
}

/// Tunables shared by every invocation of an engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Prefix of generated branch names
    pub branch_prefix: String,
    /// Request squash auto-merge on opened pull requests
    pub auto_merge: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            auto_merge: true,
        }
    }
}

pub struct MigrationEngine {
    host: Arc<dyn GitHost>,
    reporter: Arc<dyn ErrorReporter>,
    options: EngineOptions,
}

impl MigrationEngine {
    pub fn new(
        host: Arc<dyn GitHost>,
        reporter: Arc<dyn ErrorReporter>,
        options: EngineOptions,
    ) -> Self {
        Self {
            host,
            reporter,
            options,
        }
    }

    /// Apply one migration. Never fails: every error is reported and
    /// returned as an `error` result. No retries, no rollback; a branch
    /// created before a later failure is left in place.
    pub async fn apply(&self, req: MigrationRequest) -> MigrationResult {
        let req = match validate(req) {
            Ok(req) => req,
            Err(err) => return self.fail(None, err),
        };

        let branch = req
            .branch_name
            .clone()
            .unwrap_or_else(|| self.generate_branch_name());

        match self.run(&req, &branch).await {
            Ok(result) => result,
            Err(err) => self.fail(Some(branch), err),
        }
    }

    async fn run(
        &self,
        req: &MigrationRequest,
        branch: &str,
    ) -> Result<MigrationResult> {
        let repo = RepoId::new(&req.owner, &req.repo);
        let host = self.host.as_ref();

        if req.changed_files.is_empty() {
            log_stage(&repo, Stage::NoOp);
            return Ok(MigrationResult::no_op());
        }

        log_stage(&repo, Stage::Diffing);

        let base = self.resolve_base(&repo, &req.base_branch).await?;

        let plan = TreeBuilder::new(host, &repo, &base)
            .plan(&req.changed_files)
            .await?;

        let Some(plan) = plan else {
            log_stage(&repo, Stage::NoOp);
            return Ok(MigrationResult::no_op());
        };

        let changed_files = plan.changed_files();
        let body = pull_request_body(&plan);

        let writer = CommitWriter::new(host, &repo);
        let write = WriteRequest {
            base_branch: req.base_branch.clone(),
            branch: branch.to_string(),
            base_commit_sha: base.sha.clone(),
            tree: plan.request,
            message: req.commit_message.clone(),
        };

        log_stage(&repo, Stage::Branching);
        writer.create_branch(&write).await?;

        log_stage(&repo, Stage::Committing);
        writer.commit(write).await?;

        log_stage(&repo, Stage::PrOpening);

        let pr = PullRequestPublisher::new(
            host,
            &repo,
            self.reporter.as_ref(),
            self.options.auto_merge,
        )
        .publish(PublishRequest {
            base_branch: req.base_branch.clone(),
            head_branch: branch.to_string(),
            title: req.pull_request_title.clone(),
            body,
        })
        .await?;

        log_stage(&repo, Stage::Done);

        Ok(MigrationResult::success(branch, changed_files, pr.number))
    }

    /// Pin the base branch to a commit so every read and the new commit's
    /// parent refer to the same snapshot.
    async fn resolve_base(
        &self,
        repo: &RepoId,
        base_branch: &str,
    ) -> Result<GitCommit> {
        let sha = self.host.get_branch_sha(repo, base_branch).await?;
        let commit = self.host.get_commit(repo, &sha).await?;
        debug!(
            "base branch {base_branch} of {repo} is at {} (tree {})",
            commit.sha, commit.tree_sha
        );
        Ok(commit)
    }

    fn generate_branch_name(&self) -> String {
        format!(
            "{}-{}",
            self.options.branch_prefix,
            Utc::now().timestamp_millis()
        )
    }

    fn fail(&self, branch: Option<String>, err: CaretakerError) -> MigrationResult {
        self.reporter.report(&err);
        MigrationResult::failed(branch, &err)
    }
}

fn log_stage(repo: &RepoId, stage: Stage) {
    info!("migration for {repo}: {stage}");
}

/// Check required fields and normalize paths. Runs before any network call.
fn validate(mut req: MigrationRequest) -> Result<MigrationRequest> {
    let required = [
        ("owner", &req.owner),
        ("repo", &req.repo),
        ("base branch", &req.base_branch),
        ("commit message", &req.commit_message),
        ("pull request title", &req.pull_request_title),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(CaretakerError::invalid_input(format!(
                "{name} is required"
            )));
        }
    }

    if let Some(branch) = &req.branch_name {
        if branch.trim().is_empty() {
            return Err(CaretakerError::invalid_input(
                "branch name must not be empty",
            ));
        }
        if *branch == req.base_branch {
            return Err(CaretakerError::invalid_input(format!(
                "branch name must differ from base branch {}",
                req.base_branch
            )));
        }
    }

    let mut seen = HashSet::new();

    req.changed_files = req
        .changed_files
        .into_iter()
        .map(|file| {
            let path = normalize_path(&file.path);
            if path.is_empty() {
                return Err(CaretakerError::invalid_input(format!(
                    "invalid file path: {:?}",
                    file.path
                )));
            }
            if !seen.insert(path.clone()) {
                return Err(CaretakerError::invalid_input(format!(
                    "duplicate file path: {path}"
                )));
            }
            Ok(ChangedFile { path, ..file })
        })
        .collect::<Result<Vec<ChangedFile>>>()?;

    Ok(req)
}

fn pull_request_body(plan: &TreePlan) -> String {
    let mut lines = vec![
        "This pull request was opened automatically by caretaker.".to_string(),
        String::new(),
    ];

    lines.extend(plan.written.iter().map(|path| format!("- `{path}` updated")));
    lines.extend(plan.deleted.iter().map(|path| format!("- `{path}` deleted")));

    lines.join("\n")
}
