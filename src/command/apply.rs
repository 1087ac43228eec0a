//! Apply a change list read from a JSON file.
use log::*;
use std::path::Path;

use crate::{
    Result,
    cli::TargetArgs,
    command::common,
    config::Config,
    engine::{
        MigrationEngine,
        types::{ChangedFile, MigrationResult},
    },
    forge::request::RepoId,
};

pub async fn execute(
    engine: &MigrationEngine,
    config: &Config,
    target: &TargetArgs,
    repo: &RepoId,
    changes: &Path,
) -> Result<MigrationResult> {
    let changed_files: Vec<ChangedFile> =
        common::read_json_file(changes).await?;

    info!(
        "applying {} change(s) from {} to {repo}",
        changed_files.len(),
        changes.display()
    );

    let req = target.request(repo, config, changed_files, None, None)?;

    Ok(engine.apply(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::types::MigrationStatus,
        forge::request::GitCommit,
        test_helpers::host_with_files,
    };
    use std::{io::Write, sync::Arc};

    fn target() -> TargetArgs {
        TargetArgs {
            repo: "acme/widgets".into(),
            base: None,
            branch: None,
            message: None,
            title: None,
        }
    }

    #[tokio::test]
    async fn applies_changes_from_file() {
        let mut mock_host = host_with_files(vec![("file1.txt", "same")]);
        mock_host
            .expect_get_branch_sha()
            .returning(|_, _| Ok("base".into()));
        mock_host.expect_get_commit().returning(|_, _| {
            Ok(GitCommit {
                sha: "base".into(),
                tree_sha: "tree".into(),
            })
        });
        mock_host.expect_create_ref().times(0);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"path": "./file1.txt", "content": "same"}}]"#).unwrap();

        let config = Config::default();
        let engine = common::create_engine(Arc::new(mock_host), &config);
        let repo = RepoId::new("acme", "widgets");

        let result = execute(&engine, &config, &target(), &repo, file.path())
            .await
            .unwrap();

        assert_eq!(result.status, MigrationStatus::NoOp);
    }

    #[tokio::test]
    async fn malformed_change_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"path": "file1.txt"}}"#).unwrap();

        let config = Config::default();
        let engine = common::create_engine(
            Arc::new(crate::forge::traits::MockGitHost::new()),
            &config,
        );
        let repo = RepoId::new("acme", "widgets");

        let err = execute(&engine, &config, &target(), &repo, file.path())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "parse_error");
    }
}
