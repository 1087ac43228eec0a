//! Reads the current content of repository files at a fixed ref.
use base64::{Engine, engine::general_purpose::STANDARD};
use log::*;

use crate::{
    CaretakerError, Result,
    forge::{request::RepoId, traits::GitHost},
};

/// Current state of one path at the accessor's ref.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileContent {
    pub exists: bool,
    /// Decoded text content. `None` for missing files and for files whose
    /// bytes are not valid UTF-8.
    pub content: Option<String>,
    /// Blob sha
    pub sha: Option<String>,
}

impl FileContent {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Decode contents API payloads, which wrap base64 across lines.
pub fn decode_content(encoded: &str) -> Result<Vec<u8>> {
    let compact: String =
        encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

pub struct ContentAccessor<'a> {
    host: &'a dyn GitHost,
    repo: &'a RepoId,
    git_ref: &'a str,
}

impl<'a> ContentAccessor<'a> {
    pub fn new(host: &'a dyn GitHost, repo: &'a RepoId, git_ref: &'a str) -> Self {
        Self {
            host,
            repo,
            git_ref,
        }
    }

    /// Look up `path`. A missing path is reported as `exists: false` rather
    /// than an error; every other failure propagates.
    pub async fn get_content(&self, path: &str) -> Result<FileContent> {
        match self.host.get_file(self.repo, path, self.git_ref).await {
            Ok(file) => {
                let bytes = decode_content(&file.content_base64)?;
                let content = match String::from_utf8(bytes) {
                    Ok(text) => Some(text),
                    Err(_) => {
                        debug!("{path} at {} is not UTF-8 text", self.git_ref);
                        None
                    }
                };
                Ok(FileContent {
                    exists: true,
                    content,
                    sha: Some(file.sha),
                })
            }
            Err(err) if err.is_not_found() => {
                debug!("no file found for path: {path} at {}", self.git_ref);
                Ok(FileContent::missing())
            }
            Err(err) => {
                error!(
                    "error getting contents for path: {path} in {}: {err}",
                    self.repo
                );
                Err(err)
            }
        }
    }

    /// Convenience for callers that only need the text. An existing file
    /// that is not UTF-8 text is an error here.
    pub async fn read(&self, path: &str) -> Result<Option<String>> {
        let file = self.get_content(path).await?;
        if file.exists && file.content.is_none() {
            return Err(CaretakerError::invalid_input(format!(
                "{path} is not a UTF-8 text file"
            )));
        }
        Ok(file.content)
    }
}
