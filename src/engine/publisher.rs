//! Opens the migration pull request and requests squash auto-merge.
use log::*;

use crate::{
    CaretakerError, Result,
    forge::{
        request::{CreatePrRequest, RepoId},
        traits::GitHost,
    },
    reporter::ErrorReporter,
};

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub base_branch: String,
    pub head_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPr {
    pub number: u64,
    pub auto_merge_enabled: bool,
}

pub struct PullRequestPublisher<'a> {
    host: &'a dyn GitHost,
    repo: &'a RepoId,
    reporter: &'a dyn ErrorReporter,
    auto_merge: bool,
}

impl<'a> PullRequestPublisher<'a> {
    pub fn new(
        host: &'a dyn GitHost,
        repo: &'a RepoId,
        reporter: &'a dyn ErrorReporter,
        auto_merge: bool,
    ) -> Self {
        Self {
            host,
            repo,
            reporter,
            auto_merge,
        }
    }

    /// Fails only when the pull request itself cannot be created.
    /// Auto-merge is best-effort: a failure is reported and the created
    /// pull request is still returned.
    pub async fn publish(&self, req: PublishRequest) -> Result<PublishedPr> {
        info!(
            "opening PR {} -> {} in {}",
            req.head_branch, req.base_branch, self.repo
        );

        let pr = self
            .host
            .create_pr(
                self.repo,
                CreatePrRequest {
                    head_branch: req.head_branch.clone(),
                    base_branch: req.base_branch.clone(),
                    title: req.title,
                    body: req.body,
                },
            )
            .await
            .map_err(|e| CaretakerError::PullRequestCreationFailed {
                owner: self.repo.owner.clone(),
                repo: self.repo.repo.clone(),
                head: req.head_branch.clone(),
                base: req.base_branch.clone(),
                reason: e.to_string(),
            })?;

        info!("opened PR #{} in {}", pr.number, self.repo);

        if !self.auto_merge {
            return Ok(PublishedPr {
                number: pr.number,
                auto_merge_enabled: false,
            });
        }

        let auto_merge_enabled =
            match self.host.enable_auto_merge(&pr.node_id).await {
                Ok(()) => {
                    info!("enabled squash auto-merge for PR #{}", pr.number);
                    true
                }
                Err(e) => {
                    let err = CaretakerError::AutoMergeFailed {
                        pr_number: pr.number,
                        reason: e.to_string(),
                    };
                    warn!("{err}");
                    self.reporter.report(&err);
                    false
                }
            };

        Ok(PublishedPr {
            number: pr.number,
            auto_merge_enabled,
        })
    }
}
