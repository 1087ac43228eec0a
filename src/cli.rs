//! CLI argument parsing and GitHub remote configuration.
use clap::{Parser, Subcommand};
use git_url_parse::GitUrl;
use secrecy::SecretString;
use std::{env, path::PathBuf};

use crate::{
    CaretakerError, Result,
    catalog::MigrationId,
    config::Config,
    engine::types::{ChangedFile, MigrationRequest},
    forge::{config::{DEFAULT_HOST, RemoteConfig}, request::RepoId},
};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Global CLI arguments for GitHub access, configuration and debugging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = DEFAULT_HOST, global = true)]
    /// GitHub host. Use the Enterprise Server hostname for self-hosted instances.
    pub github_host: String,

    #[arg(long, default_value = "", global = true)]
    /// GitHub access token. Falls back to a token in the repo URL, then GITHUB_TOKEN.
    pub github_token: String,

    #[arg(long, global = true)]
    /// Path to caretaker.toml. Defaults to ./caretaker.toml when present.
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false, global = true)]
    /// Log writes instead of performing them.
    pub dry_run: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Where and how a single migration lands.
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(long)]
    /// Repository as owner/repo or https URL.
    pub repo: String,

    #[arg(long)]
    /// Base branch. Defaults to base_branch from the config.
    pub base: Option<String>,

    #[arg(long)]
    /// Head branch. Generated from branch_prefix when omitted.
    pub branch: Option<String>,

    #[arg(long)]
    /// Commit message.
    pub message: Option<String>,

    #[arg(long)]
    /// Pull request title. Defaults to the commit message.
    pub title: Option<String>,
}

/// Migration subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a JSON list of file changes as one auto-merging pull request.
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long)]
        /// JSON file holding a list of {path, content, operation} changes.
        changes: PathBuf,
    },

    /// Compute a catalog migration and apply it.
    Migrate {
        /// Migration id, see `caretaker list`.
        migration: MigrationId,

        #[command(flatten)]
        target: TargetArgs,

        #[arg(long, default_value = "{}")]
        /// Migration parameters as a JSON object.
        params: String,
    },

    /// Apply a JSON list of migration requests one at a time.
    Batch {
        #[arg(long)]
        /// JSON file holding a list of migration requests.
        requests: PathBuf,
    },

    /// List available migrations.
    List,

    /// Read one worker request from stdin and answer on stdout.
    #[command(hide = true)]
    Worker,
}

/// Repository named on the command line, with whatever a URL carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub repo: RepoId,
    pub host: Option<String>,
    pub scheme: Option<String>,
    pub token: Option<String>,
}

impl Args {
    /// Connection settings for `target`, or for `--github-host` when the
    /// repositories come from a request file.
    pub fn remote_config(&self, target: Option<&RepoTarget>) -> Result<RemoteConfig> {
        let mut token = self.github_token.clone();

        if token.is_empty()
            && let Some(url_token) = target.and_then(|t| t.token.clone())
        {
            token = url_token;
        }

        if token.is_empty()
            && let Ok(env_var_token) = env::var(GITHUB_TOKEN_ENV)
        {
            token = env_var_token;
        }

        if token.is_empty() {
            return Err(CaretakerError::InvalidArgs("must set github token".into()));
        }

        let host = target
            .and_then(|t| t.host.clone())
            .unwrap_or_else(|| self.github_host.clone());

        let scheme = target
            .and_then(|t| t.scheme.clone())
            .unwrap_or_else(|| "https".to_string());

        Ok(RemoteConfig {
            host,
            scheme,
            token: SecretString::from(token),
            dry_run: self.dry_run,
        })
    }
}

impl TargetArgs {
    pub fn target(&self) -> Result<RepoTarget> {
        parse_repo(&self.repo)
    }

    /// Build the engine request, filling gaps from `config` and then from
    /// the given fallbacks.
    pub fn request(
        &self,
        repo: &RepoId,
        config: &Config,
        changed_files: Vec<ChangedFile>,
        default_message: Option<&str>,
        default_title: Option<&str>,
    ) -> Result<MigrationRequest> {
        let commit_message = self
            .message
            .clone()
            .or_else(|| default_message.map(String::from))
            .unwrap_or_else(|| config.commit_message.clone());

        let pull_request_title = self
            .title
            .clone()
            .or_else(|| default_title.map(String::from))
            .unwrap_or_else(|| commit_message.clone());

        let mut builder = MigrationRequest::builder();
        builder
            .owner(&repo.owner)
            .repo(&repo.repo)
            .base_branch(self.base.clone().unwrap_or_else(|| config.base_branch.clone()))
            .changed_files(changed_files)
            .commit_message(commit_message)
            .pull_request_title(pull_request_title);

        if let Some(branch) = &self.branch {
            builder.branch_name(branch);
        }

        builder.build()
    }
}

/// Validate repository URL uses HTTP or HTTPS scheme.
fn validate_scheme(scheme: git_url_parse::Scheme) -> Result<()> {
    match scheme {
        git_url_parse::Scheme::Http => Ok(()),
        git_url_parse::Scheme::Https => Ok(()),
        _ => Err(CaretakerError::InvalidArgs(
            "only http and https schemes are supported for repo urls".into(),
        )),
    }
}

/// Parse `owner/repo` or an http(s) repository URL.
pub fn parse_repo(input: &str) -> Result<RepoTarget> {
    let input = input.trim();

    if !input.contains("://") {
        let parts = input.split('/').collect::<Vec<&str>>();
        return match parts.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(RepoTarget {
                repo: RepoId::new(*owner, repo.trim_end_matches(".git")),
                host: None,
                scheme: None,
                token: None,
            }),
            _ => Err(CaretakerError::InvalidArgs(format!(
                "expected owner/repo or a repository url, got: {input}"
            ))),
        };
    }

    let parsed = GitUrl::parse(input)?;

    validate_scheme(parsed.scheme)?;

    let host = parsed.host.ok_or_else(|| {
        CaretakerError::InvalidArgs("unable to parse host from github repo".into())
    })?;

    let owner = parsed.owner.ok_or_else(|| {
        CaretakerError::InvalidArgs("unable to parse owner from github repo".into())
    })?;

    Ok(RepoTarget {
        repo: RepoId::new(owner, parsed.name),
        host: Some(host),
        scheme: Some(parsed.scheme.to_string()),
        token: parsed.token,
    })
}
