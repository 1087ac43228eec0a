use log::*;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::LazyLock;

use crate::{
    CaretakerError, Result,
    catalog::{MigrationContext, MigrationPlan},
    engine::types::ChangedFile,
};

pub const NVMRC: &str = ".nvmrc";
pub const DOCKERFILE: &str = "Dockerfile";

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+){0,2}$").unwrap());

static FROM_NODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^(\s*FROM\s+(?:--platform=\S+\s+)?(?:docker\.io/)?(?:library/)?node:)(\d+(?:\.\d+){0,2})",
    )
    .unwrap()
});

#[derive(Debug, Clone, Deserialize)]
pub struct NodeVersionParams {
    /// Major, major.minor or full version; a leading `v` is dropped
    pub version: String,
}

pub async fn compute(
    ctx: &MigrationContext<'_>,
    params: NodeVersionParams,
) -> Result<MigrationPlan> {
    let version = params.version.trim().trim_start_matches('v').to_string();

    if !VERSION_REGEX.is_match(&version) {
        return Err(CaretakerError::invalid_input(format!(
            "invalid node version: {}",
            params.version
        )));
    }

    let mut changed_files = vec![];

    let nvmrc = format!("{version}\n");
    match ctx.read(NVMRC).await? {
        Some(current) if current.trim() == version => {
            debug!("{NVMRC} already pins {version}");
        }
        Some(_) => changed_files.push(ChangedFile::updated(NVMRC, nvmrc)),
        None => changed_files.push(ChangedFile::created(NVMRC, nvmrc)),
    }

    if let Some(current) = ctx.read(DOCKERFILE).await? {
        let updated = rewrite_dockerfile(&current, &version);
        if updated != current {
            changed_files.push(ChangedFile::updated(DOCKERFILE, updated));
        }
    }

    Ok(MigrationPlan {
        changed_files,
        commit_message: format!("chore: update node to {version}"),
        pull_request_title: format!("Update Node.js to {version}"),
    })
}

/// Replace the version part of every `FROM node:<version>` image, keeping
/// any variant suffix such as `-alpine`.
pub fn rewrite_dockerfile(content: &str, version: &str) -> String {
    FROM_NODE_REGEX
        .replace_all(content, |caps: &Captures| format!("{}{version}", &caps[1]))
        .to_string()
}
