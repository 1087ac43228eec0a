//! Statically enumerated migrations. Each [`MigrationId`] maps to exactly one
//! typed handler that reads the repository and returns the change set to
//! apply; nothing is looked up by name at runtime.
use log::*;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumMessage, EnumString};

use crate::{
    CaretakerError, Result,
    engine::{content::ContentAccessor, types::ChangedFile},
    forge::{config::TREE_BLOB_TYPE, request::RepoId, traits::GitHost},
};

pub mod exclude_update_package;
pub mod node_version;
pub mod oidc_permissions;
pub mod runner_os;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    EnumMessage,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MigrationId {
    #[strum(message = "Pin the Node.js version in .nvmrc and Dockerfile")]
    NodeVersion,
    #[strum(message = "Move GitHub Actions jobs to another runner image")]
    RunnerOs,
    #[strum(message = "Grant id-token: write to a workflow")]
    OidcPermissions,
    #[strum(message = "Exclude a package from the package.json update script")]
    ExcludeUpdatePackage,
}

impl MigrationId {
    pub fn parse(id: &str) -> Result<Self> {
        Self::from_str(id)
            .map_err(|_| CaretakerError::UnknownMigration(id.to_string()))
    }

    pub fn description(&self) -> &'static str {
        self.get_message().unwrap_or_default()
    }
}

/// Change set computed by a migration, ready to hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub changed_files: Vec<ChangedFile>,
    pub commit_message: String,
    pub pull_request_title: String,
}

/// Read access to one repository at one ref.
pub struct MigrationContext<'a> {
    pub host: &'a dyn GitHost,
    pub repo: &'a RepoId,
    /// Branch the migration reads from
    pub git_ref: &'a str,
}

impl<'a> MigrationContext<'a> {
    pub fn new(host: &'a dyn GitHost, repo: &'a RepoId, git_ref: &'a str) -> Self {
        Self {
            host,
            repo,
            git_ref,
        }
    }

    pub fn accessor(&self) -> ContentAccessor<'a> {
        ContentAccessor::new(self.host, self.repo, self.git_ref)
    }

    pub async fn read(&self, path: &str) -> Result<Option<String>> {
        self.accessor().read(path).await
    }

    /// Every file path in the repository at the context's branch.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let sha = self.host.get_branch_sha(self.repo, self.git_ref).await?;
        let commit = self.host.get_commit(self.repo, &sha).await?;
        let entries = self
            .host
            .get_tree_recursive(self.repo, &commit.tree_sha)
            .await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind == TREE_BLOB_TYPE)
            .map(|entry| entry.path)
            .collect())
    }
}

/// Run the handler for `id` with JSON `params`.
pub async fn compute(
    id: MigrationId,
    ctx: &MigrationContext<'_>,
    params: Value,
) -> Result<MigrationPlan> {
    info!("computing migration {id} for {} at {}", ctx.repo, ctx.git_ref);

    let plan = match id {
        MigrationId::NodeVersion => {
            node_version::compute(ctx, parse_params(id, params)?).await?
        }
        MigrationId::RunnerOs => {
            runner_os::compute(ctx, parse_params(id, params)?).await?
        }
        MigrationId::OidcPermissions => {
            oidc_permissions::compute(ctx, parse_params(id, params)?).await?
        }
        MigrationId::ExcludeUpdatePackage => {
            exclude_update_package::compute(ctx, parse_params(id, params)?)
                .await?
        }
    };

    info!(
        "migration {id} produced {} change(s) for {}",
        plan.changed_files.len(),
        ctx.repo
    );

    Ok(plan)
}

fn parse_params<P: DeserializeOwned>(id: MigrationId, params: Value) -> Result<P> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };

    serde_json::from_value(params).map_err(|e| {
        CaretakerError::invalid_input(format!("invalid parameters for {id}: {e}"))
    })
}
