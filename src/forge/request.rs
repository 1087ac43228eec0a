use serde::{Deserialize, Serialize};
use std::fmt;

use crate::forge::config::{TREE_BLOB_MODE, TREE_BLOB_TYPE};

/// Identifies a repository on the configured host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw file content as served by the contents API.
pub struct RemoteFile {
    /// Blob sha of the file at the requested ref
    pub sha: String,
    /// Base64 encoded content, possibly wrapped across lines
    pub content_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A commit and the root tree it points at.
pub struct GitCommit {
    pub sha: String,
    pub tree_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// One record of a recursive tree listing.
pub struct RemoteTreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single entry of a tree write. Carries either inline `content` for a
/// new or updated blob, or the `sha` of an existing object that is kept
/// as-is.
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl TreeEntry {
    /// New or updated regular file with inline content.
    pub fn blob(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: TREE_BLOB_MODE.into(),
            kind: TREE_BLOB_TYPE.into(),
            content: Some(content.into()),
            sha: None,
        }
    }

    /// Existing object carried over unchanged from a recursive listing.
    pub fn carried(entry: &RemoteTreeEntry) -> Self {
        Self {
            path: entry.path.clone(),
            mode: entry.mode.clone(),
            kind: entry.kind.clone(),
            content: None,
            sha: Some(entry.sha.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Request to create a tree. With `base_tree` set, entries are layered on
/// top of it and unmentioned paths survive; without it the entries are the
/// complete listing.
pub struct CreateTreeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Request to create a commit object.
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new pull request.
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Pull request information.
pub struct PullRequest {
    pub number: u64,
    /// Opaque GraphQL id used by mutations
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub sha: String,
}
