//! Git hosting platform access.
//!
//! Provides the low-level Git Data API surface (refs, commits, trees, file
//! contents, pull requests) the migration engine writes through.

/// Connection configuration and shared constants.
pub mod config;

/// Dry-run wrapper that turns writes into log lines.
pub mod dry_run;

/// GitHub API client implementation for GitHub.com and Enterprise.
pub mod github;

/// Request and response types shared by every host implementation.
pub mod request;

/// Common trait for git hosting platform abstraction.
pub mod traits;

/// Builds the configured host.
pub mod factory;
