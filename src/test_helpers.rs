//! Common test helper functions shared across test modules.
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::SecretString;

use crate::{
    CaretakerError,
    forge::{
        config::RemoteConfig,
        request::{GitCommit, RemoteFile, RemoteTreeEntry},
        traits::MockGitHost,
    },
};

/// Creates a test RemoteConfig pointing at github.com.
pub fn create_test_remote_config() -> RemoteConfig {
    RemoteConfig {
        host: "github.com".to_string(),
        scheme: "https".to_string(),
        token: SecretString::from("test-token".to_string()),
        dry_run: false,
    }
}

/// Contents API payload for `path`, base64 wrapped like the API does.
pub fn remote_file(path: &str, content: &str) -> RemoteFile {
    let encoded = STANDARD.encode(content);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect::<Vec<String>>()
        .join("\n");

    RemoteFile {
        sha: format!("sha-{path}"),
        content_base64: wrapped,
    }
}

/// Blob entry of a recursive tree listing.
pub fn tree_blob(path: &str) -> RemoteTreeEntry {
    RemoteTreeEntry {
        path: path.to_string(),
        mode: "100644".to_string(),
        kind: "blob".to_string(),
        sha: format!("sha-{path}"),
    }
}

/// Mock host serving `files` from get_file; every other path is a 404.
///
/// # Example
/// ```ignore
/// let mock_host = host_with_files(vec![(".nvmrc", "18\n")]);
/// ```
pub fn host_with_files(files: Vec<(&'static str, &'static str)>) -> MockGitHost {
    let mut mock_host = MockGitHost::new();
    mock_host.expect_get_file().returning(move |_, path, _| {
        files
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(p, content)| remote_file(p, content))
            .ok_or_else(|| CaretakerError::not_found(path))
    });
    mock_host
}

/// Like [`host_with_files`], with `main` resolving to a commit whose
/// recursive listing contains exactly `files`.
pub fn host_with_tree(files: Vec<(&'static str, &'static str)>) -> MockGitHost {
    let listing = files.iter().map(|(path, _)| tree_blob(path)).collect::<Vec<_>>();
    let mut mock_host = host_with_files(files);

    mock_host
        .expect_get_branch_sha()
        .returning(|_, _| Ok("head-sha".to_string()));
    mock_host.expect_get_commit().returning(|_, sha| {
        Ok(GitCommit {
            sha: sha.to_string(),
            tree_sha: "head-tree".to_string(),
        })
    });
    mock_host
        .expect_get_tree_recursive()
        .returning(move |_, _| Ok(listing.clone()));

    mock_host
}
