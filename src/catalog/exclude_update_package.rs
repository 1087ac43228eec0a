use log::*;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::LazyLock;

use crate::{
    CaretakerError, Result,
    catalog::{MigrationContext, MigrationPlan},
    engine::types::ChangedFile,
};

pub const PACKAGE_JSON: &str = "package.json";

static REJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"--reject(=|\s+)(["']?)([^\s"']+)(["']?)"#).unwrap()
});

fn default_script() -> String {
    "update".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExcludeUpdatePackageParams {
    pub package: String,
    /// package.json script that runs the dependency updater
    #[serde(default = "default_script")]
    pub script: String,
}

pub async fn compute(
    ctx: &MigrationContext<'_>,
    params: ExcludeUpdatePackageParams,
) -> Result<MigrationPlan> {
    let package = params.package.trim();

    if package.is_empty() || package.contains(char::is_whitespace) {
        return Err(CaretakerError::invalid_input(format!(
            "invalid package name: {:?}",
            params.package
        )));
    }

    let content = ctx
        .read(PACKAGE_JSON)
        .await?
        .ok_or_else(|| CaretakerError::not_found(PACKAGE_JSON))?;

    let mut doc: Value = serde_json::from_str(&content)?;

    let Some(command) = doc["scripts"][&params.script].as_str() else {
        return Err(CaretakerError::invalid_input(format!(
            "{PACKAGE_JSON} has no {} script",
            params.script
        )));
    };

    let mut changed_files = vec![];

    match add_reject(command, package) {
        Some(updated) => {
            info!("excluding {package} from {} script", params.script);
            doc["scripts"][&params.script] = json!(updated);
            let formatted_json = format!("{}\n", serde_json::to_string_pretty(&doc)?);
            changed_files.push(ChangedFile::updated(PACKAGE_JSON, formatted_json));
        }
        None => debug!("{package} is already excluded from {}", params.script),
    }

    Ok(MigrationPlan {
        changed_files,
        commit_message: format!("chore: exclude {package} from dependency updates"),
        pull_request_title: format!("Exclude {package} from dependency updates"),
    })
}

/// Add `package` to the command's `--reject` list, creating the flag when
/// absent. Returns `None` when it is already rejected.
pub fn add_reject(command: &str, package: &str) -> Option<String> {
    match REJECT_REGEX.captures(command) {
        Some(caps) => {
            let rejected = &caps[3];
            if rejected.split(',').any(|name| name == package) {
                return None;
            }

            let updated = REJECT_REGEX.replacen(command, 1, |caps: &Captures| {
                format!(
                    "--reject{}{}{},{package}{}",
                    &caps[1], &caps[2], &caps[3], &caps[4]
                )
            });
            Some(updated.to_string())
        }
        None => Some(format!("{} --reject {package}", command.trim_end())),
    }
}
