//! Configuration loading and parsing for `caretaker.toml` files.
use log::*;
use serde::Deserialize;
use std::{path::Path, time::Duration};

use crate::{
    CaretakerError, Result,
    engine::EngineOptions,
    forge::config::{DEFAULT_BASE_BRANCH, DEFAULT_BRANCH_PREFIX},
    retry::RetryPolicy,
};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "caretaker.toml";

pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: apply migration";
pub const DEFAULT_WORKER_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_WORKER_BACKOFF_MS: u64 = 5000;

/// Out-of-process migration worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)] // Use default for missing fields
pub struct WorkerConfig {
    /// Worker executable; migrations run in-process when unset
    pub program: Option<String>,
    pub args: Vec<String>,
    /// Attempts per request, counting the first (default: 3)
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds (default: 5000)
    pub backoff_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: vec![],
            max_attempts: DEFAULT_WORKER_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_WORKER_BACKOFF_MS,
        }
    }
}

impl WorkerConfig {
    /// Worker failures are retried only when a dependency version could not
    /// be resolved yet.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::version_not_found(
            self.max_attempts,
            Duration::from_millis(self.backoff_ms),
        )
    }
}

/// Root configuration structure for `caretaker.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Branch pull requests target (default: "main")
    pub base_branch: String,
    /// Prefix of generated branch names
    pub branch_prefix: String,
    /// Commit message used when a request does not carry one
    pub commit_message: String,
    /// Request squash auto-merge on opened pull requests (default: true)
    pub auto_merge: bool,
    pub worker: WorkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.into(),
            branch_prefix: DEFAULT_BRANCH_PREFIX.into(),
            commit_message: DEFAULT_COMMIT_MESSAGE.into(),
            auto_merge: true,
            worker: WorkerConfig::default(),
        }
    }
}

impl Config {
    /// Load `path`, or `caretaker.toml` in the working directory when no
    /// path is given. Only the implicit default file may be absent.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err)
                if err.kind() == std::io::ErrorKind::NotFound && !required =>
            {
                debug!("no {} found: using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(CaretakerError::invalid_config(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        info!("loading configuration from {}", path.display());
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.base_branch.trim().is_empty() {
            return Err(CaretakerError::invalid_config("base_branch is empty"));
        }
        if self.branch_prefix.trim().is_empty() {
            return Err(CaretakerError::invalid_config("branch_prefix is empty"));
        }
        if self.worker.max_attempts == 0 {
            return Err(CaretakerError::invalid_config(
                "worker.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            branch_prefix: self.branch_prefix.clone(),
            auto_merge: self.auto_merge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.base_branch, "main");
        assert_eq!(config.branch_prefix, "caretaker-migration");
        assert!(config.auto_merge);
        assert_eq!(config.worker.max_attempts, 3);
        assert_eq!(config.worker.backoff_ms, 5000);
        assert!(config.worker.program.is_none());
    }

    #[test]
    fn parses_partial_config() {
        let config = Config::parse(
            r#"
base_branch = "develop"
auto_merge = false

[worker]
program = "caretaker-worker"
args = ["--json"]
"#,
        )
        .unwrap();

        assert_eq!(config.base_branch, "develop");
        assert_eq!(config.branch_prefix, "caretaker-migration");
        assert!(!config.auto_merge);
        assert_eq!(config.worker.program.as_deref(), Some("caretaker-worker"));
        assert_eq!(config.worker.args, vec!["--json"]);
        assert_eq!(config.worker.max_attempts, 3);

        let options = config.engine_options();
        assert!(!options.auto_merge);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = Config::parse("[worker]\nmax_attempts = 0\n").unwrap_err();
        assert!(matches!(err, CaretakerError::InvalidConfig(_)));

        let err = Config::parse("auto_merge = \"yes\"").unwrap_err();
        assert_eq!(err.code(), "parse_error");
    }

    #[tokio::test]
    async fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "branch_prefix = \"deps\"").unwrap();

        let config = Config::load(Some(file.path())).await.unwrap();

        assert_eq!(config.branch_prefix, "deps");
        assert_eq!(config.worker.retry_policy().max_attempts, 3);
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("caretaker.toml");

        let err = Config::load(Some(&missing)).await.unwrap_err();

        assert!(matches!(err, CaretakerError::InvalidConfig(_)));
    }
}
