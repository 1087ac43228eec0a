//! Factory for creating the git host implementation from configuration.
use log::*;
use std::sync::Arc;

use crate::{
    Result,
    forge::{
        config::RemoteConfig, dry_run::DryRunHost, github::Github,
        traits::GitHost,
    },
};

pub struct HostFactory;

impl HostFactory {
    /// GitHub client for `config`, wrapped in a [`DryRunHost`] when
    /// `config.dry_run` is set.
    pub fn create(config: &RemoteConfig) -> Result<Arc<dyn GitHost>> {
        let github = Github::new(config.clone())?;

        if config.dry_run {
            warn!("dry_run: no branches, commits or pull requests will be created");
            return Ok(Arc::new(DryRunHost::new(Box::new(github))));
        }

        Ok(Arc::new(github))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_remote_config;

    #[tokio::test]
    async fn creates_github_host() {
        let config = create_test_remote_config();
        assert!(HostFactory::create(&config).is_ok());
    }

    #[tokio::test]
    async fn creates_dry_run_host() {
        let config = RemoteConfig {
            dry_run: true,
            ..create_test_remote_config()
        };
        assert!(HostFactory::create(&config).is_ok());
    }
}
