//! Error taxonomy for caretaker operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for caretaker operations.
#[derive(Error, Debug)]
pub enum CaretakerError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request validation errors
    #[error("Invalid migration request: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Engine write failures
    #[error(
        "Failed to create branch '{branch}' in {owner}/{repo}: {reason}"
    )]
    BranchCreationFailed {
        owner: String,
        repo: String,
        branch: String,
        reason: String,
    },

    #[error(
        "Failed to {operation} for branch '{branch}' in {owner}/{repo}: {reason}"
    )]
    CommitWriteFailed {
        owner: String,
        repo: String,
        branch: String,
        operation: String,
        reason: String,
    },

    #[error(
        "Failed to open pull request {head} -> {base} in {owner}/{repo}: {reason}"
    )]
    PullRequestCreationFailed {
        owner: String,
        repo: String,
        head: String,
        base: String,
        reason: String,
    },

    #[error("Failed to enable auto-merge for PR #{pr_number}: {reason}")]
    AutoMergeFailed { pr_number: u64, reason: String },

    #[error("Recursive tree listing for {0} was truncated")]
    TruncatedTree(String),

    // Forge/API errors
    #[error("Forge operation failed: {0}")]
    ForgeError(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    // Migration catalog and worker errors
    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    #[error("Migration worker failed: {0}")]
    Worker(String),

    #[error("Git URL parse error: {0}")]
    GitUrlError(#[from] git_url_parse::GitUrlParseError),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using CaretakerError
pub type Result<T> = std::result::Result<T, CaretakerError>;

impl CaretakerError {
    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::ForgeError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a request validation error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable machine-readable code for callers that map errors onto
    /// responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgs(_) => "invalid_args",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidInput(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::BranchCreationFailed { .. } => "branch_creation_failed",
            Self::CommitWriteFailed { .. } => "commit_write_failed",
            Self::PullRequestCreationFailed { .. } => {
                "pull_request_creation_failed"
            }
            Self::AutoMergeFailed { .. } => "auto_merge_failed",
            Self::TruncatedTree(_) => "truncated_tree",
            Self::ForgeError(_) => "forge_error",
            Self::AuthenticationError(_) => "authentication_failed",
            Self::RateLimitExceeded => "rate_limited",
            Self::UnknownMigration(_) => "unknown_migration",
            Self::Worker(_) => "worker_failed",
            Self::GitUrlError(_) => "invalid_repo_url",
            Self::JsonParseError(_)
            | Self::TomlParseError(_)
            | Self::RegexError(_)
            | Self::Base64DecodeError(_) => "parse_error",
            Self::LoggerError(_) | Self::Other(_) => "internal_error",
        }
    }
}

// Implement From for std::io::Error - wraps in Other variant for generic I/O errors
impl From<std::io::Error> for CaretakerError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

// Implement From for octocrab errors (GitHub API)
impl From<octocrab::Error> for CaretakerError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                Self::NotFound(source.message.clone())
            }
            octocrab::Error::GitHub { source, .. }
                if source.status_code == StatusCode::UNAUTHORIZED
                    || (source.status_code == StatusCode::FORBIDDEN
                        && !source.message.contains("rate limit")) =>
            {
                Self::AuthenticationError(source.message.clone())
            }
            octocrab::Error::GitHub { source, .. }
                if source.message.contains("rate limit") =>
            {
                Self::RateLimitExceeded
            }
            _ => Self::ForgeError(format!("GitHub API error: {}", err)),
        }
    }
}
