//! Compute a catalog migration through a channel and apply the result.
use log::*;
use serde_json::Value;

use crate::{
    CaretakerError, Result,
    catalog::MigrationId,
    channel::{MigrationChannel, WorkerRequest},
    cli::TargetArgs,
    config::Config,
    engine::{MigrationEngine, types::MigrationResult},
    forge::request::RepoId,
    reporter::ErrorReporter,
};

pub struct MigrateRequest<'a> {
    pub migration: MigrationId,
    pub target: &'a TargetArgs,
    pub repo: &'a RepoId,
    /// JSON object of migration parameters
    pub params: &'a str,
}

/// Failures while computing the migration are reported and returned as an
/// error result, the same way the engine treats its own failures.
pub async fn execute(
    engine: &MigrationEngine,
    channel: &dyn MigrationChannel,
    reporter: &dyn ErrorReporter,
    config: &Config,
    req: MigrateRequest<'_>,
) -> Result<MigrationResult> {
    let params: Value = serde_json::from_str(req.params).map_err(|e| {
        CaretakerError::InvalidArgs(format!("invalid --params: {e}"))
    })?;

    let base_branch = req
        .target
        .base
        .clone()
        .unwrap_or_else(|| config.base_branch.clone());

    let response = channel
        .invoke(WorkerRequest {
            command: req.migration,
            repo: req.repo.clone(),
            git_ref: base_branch,
            params,
        })
        .await;

    let plan = match response {
        Ok(response) => response.plan,
        Err(err) => {
            reporter.report(&err);
            return Ok(MigrationResult::failed(None, &err));
        }
    };

    info!(
        "{} planned {} change(s) for {}",
        req.migration,
        plan.changed_files.len(),
        req.repo
    );

    let migration_req = req.target.request(
        req.repo,
        config,
        plan.changed_files,
        Some(&plan.commit_message),
        Some(&plan.pull_request_title),
    )?;

    Ok(engine.apply(migration_req).await)
}
