use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{CaretakerError, Result, forge::config::DEFAULT_BASE_BRANCH};

/// What a [`ChangedFile`] asks to happen to its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Created,
    Updated,
    Deleted,
}

/// A requested mutation to one path. Without an explicit operation the file
/// is written with update-or-create semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path with POSIX separators
    pub path: String,
    /// Desired final content, ignored for deletions
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<FileOperation>,
}

impl ChangedFile {
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            operation: None,
        }
    }

    pub fn created(
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            operation: Some(FileOperation::Created),
            ..Self::write(path, content)
        }
    }

    pub fn updated(
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            operation: Some(FileOperation::Updated),
            ..Self::write(path, content)
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: String::new(),
            operation: Some(FileOperation::Deleted),
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self.operation, Some(FileOperation::Deleted))
    }
}

/// Strip the leading `./` or `/` callers sometimes put on repository paths.
pub fn normalize_path(path: &str) -> String {
    let mut path = path.trim();
    loop {
        if let Some(stripped) = path.strip_prefix("./") {
            path = stripped;
        } else if let Some(stripped) = path.strip_prefix('/') {
            path = stripped;
        } else {
            break;
        }
    }
    path.to_string()
}

fn default_base_branch() -> String {
    DEFAULT_BASE_BRANCH.to_string()
}

/// Everything the engine needs to turn a change set into a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Deserialize)]
#[builder(setter(into), build_fn(private, name = "_build"))]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    pub owner: String,
    pub repo: String,
    /// Left empty when absent from JSON so the caller can apply its
    /// configured base branch
    #[builder(default = "default_base_branch()")]
    #[serde(default)]
    pub base_branch: String,
    /// Generated from the configured prefix and a timestamp when absent
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub branch_name: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub changed_files: Vec<ChangedFile>,
    #[serde(default)]
    pub commit_message: String,
    #[serde(default)]
    pub pull_request_title: String,
}

impl MigrationRequest {
    pub fn builder() -> MigrationRequestBuilder {
        MigrationRequestBuilder::default()
    }
}

impl MigrationRequestBuilder {
    pub fn build(&self) -> Result<MigrationRequest> {
        self._build().map_err(|e| {
            CaretakerError::invalid_input(format!(
                "failed to build migration request: {}",
                e
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "no-op")]
    NoOp,
    #[serde(rename = "error")]
    Error,
}

pub const SUCCESS_MESSAGE: &str = "Migration completed successfully";
pub const NO_OP_MESSAGE: &str = "No changes needed";
pub const ERROR_MESSAGE: &str = "Migration failed";

/// Outcome of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub status: MigrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    /// Entries actually written after diffing, deletions included
    pub changed_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_number: Option<u64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl MigrationResult {
    pub fn success(
        branch_name: impl Into<String>,
        changed_files: usize,
        pull_request_number: u64,
    ) -> Self {
        Self {
            status: MigrationStatus::Success,
            branch_name: Some(branch_name.into()),
            changed_files,
            pull_request_number: Some(pull_request_number),
            message: SUCCESS_MESSAGE.into(),
            error: None,
            error_code: None,
        }
    }

    pub fn no_op() -> Self {
        Self {
            status: MigrationStatus::NoOp,
            branch_name: None,
            changed_files: 0,
            pull_request_number: None,
            message: NO_OP_MESSAGE.into(),
            error: None,
            error_code: None,
        }
    }

    pub fn failed(branch_name: Option<String>, err: &CaretakerError) -> Self {
        Self {
            status: MigrationStatus::Error,
            branch_name,
            changed_files: 0,
            pull_request_number: None,
            message: format!("{ERROR_MESSAGE}: {err}"),
            error: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == MigrationStatus::Error
    }
}
