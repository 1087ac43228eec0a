//! Common test utilities for engine tests.

use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;

use crate::{
    CaretakerError,
    engine::{EngineOptions, MigrationEngine, types::MigrationRequest},
    forge::{
        request::{GitCommit, PullRequest, RemoteFile},
        traits::MockGitHost,
    },
    reporter::RecordingReporter,
};

pub use crate::engine::types::{ChangedFile, MigrationStatus};

pub const BASE_COMMIT: &str = "base-commit";
pub const BASE_TREE: &str = "base-tree";
pub const NEW_TREE: &str = "new-tree";
pub const NEW_COMMIT: &str = "new-commit";
pub const PR_NUMBER: u64 = 7;

/// Mock host with `main` at BASE_COMMIT and the given files present; every
/// other path is a 404. Write expectations are left to each test.
pub fn mock_repo_host(files: Vec<(&'static str, &'static str)>) -> MockGitHost {
    let mut mock_host = MockGitHost::new();

    mock_host
        .expect_get_branch_sha()
        .withf(|_, branch| branch == "main")
        .returning(|_, _| Ok(BASE_COMMIT.to_string()));

    mock_host
        .expect_get_commit()
        .withf(|_, sha| sha == BASE_COMMIT)
        .returning(|_, _| {
            Ok(GitCommit {
                sha: BASE_COMMIT.into(),
                tree_sha: BASE_TREE.into(),
            })
        });

    mock_host
        .expect_get_file()
        .withf(|_, _, git_ref| git_ref == BASE_COMMIT)
        .returning(move |_, path, _| {
            files
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(p, content)| RemoteFile {
                    sha: format!("sha-{p}"),
                    content_base64: STANDARD.encode(content),
                })
                .ok_or_else(|| CaretakerError::not_found(path))
        });

    mock_host
}

/// Expect exactly one branch, tree, commit, ref update, PR and auto-merge.
pub fn expect_full_write(mock_host: &mut MockGitHost) {
    mock_host
        .expect_create_ref()
        .withf(|_, _, sha| sha == BASE_COMMIT)
        .times(1)
        .returning(|_, _, _| Ok(()));
    mock_host
        .expect_create_tree()
        .times(1)
        .returning(|_, _| Ok(NEW_TREE.into()));
    mock_host
        .expect_create_commit()
        .withf(|_, req| req.tree == NEW_TREE && req.parents == [BASE_COMMIT])
        .times(1)
        .returning(|_, _| Ok(NEW_COMMIT.into()));
    mock_host
        .expect_update_ref()
        .withf(|_, _, sha| sha == NEW_COMMIT)
        .times(1)
        .returning(|_, _, _| Ok(()));
    mock_host.expect_create_pr().times(1).returning(|_, _| {
        Ok(PullRequest {
            number: PR_NUMBER,
            node_id: "PR_node".into(),
        })
    });
    mock_host
        .expect_enable_auto_merge()
        .times(1)
        .returning(|_| Ok(()));
}

/// Expect that nothing at all is written.
pub fn expect_no_writes(mock_host: &mut MockGitHost) {
    mock_host.expect_create_ref().times(0);
    mock_host.expect_create_tree().times(0);
    mock_host.expect_create_commit().times(0);
    mock_host.expect_update_ref().times(0);
    mock_host.expect_create_pr().times(0);
    mock_host.expect_enable_auto_merge().times(0);
}

pub fn create_engine(
    mock_host: MockGitHost,
) -> (MigrationEngine, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let engine = MigrationEngine::new(
        Arc::new(mock_host),
        reporter.clone(),
        EngineOptions::default(),
    );
    (engine, reporter)
}

pub fn request(changed_files: Vec<ChangedFile>) -> MigrationRequest {
    MigrationRequest::builder()
        .owner("acme")
        .repo("widgets")
        .changed_files(changed_files)
        .commit_message("chore: apply migration")
        .pull_request_title("Apply migration")
        .build()
        .unwrap()
}
