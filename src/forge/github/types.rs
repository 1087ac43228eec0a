use serde::Deserialize;

use crate::forge::request::RemoteTreeEntry;

#[derive(Debug, Deserialize)]
pub struct TreeRef {
    pub sha: String,
}

/// Response of `GET /repos/{owner}/{repo}/git/commits/{sha}`.
#[derive(Debug, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub tree: TreeRef,
}

/// Response of `GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1`.
#[derive(Debug, Deserialize)]
pub struct GithubTreeListing {
    pub sha: String,
    pub tree: Vec<RemoteTreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct Tree {
    pub sha: String,
}

pub const FILE_CONTENT_TYPE: &str = "file";
