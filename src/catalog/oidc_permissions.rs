use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::LazyLock;

use crate::{
    CaretakerError, Result,
    catalog::{MigrationContext, MigrationPlan, runner_os::WORKFLOWS_DIR},
    engine::types::{ChangedFile, normalize_path},
};

static ID_TOKEN_WRITE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*id-token:[ \t]*write[ \t]*(?:#.*)?$").unwrap()
});

static ID_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*id-token:[ \t]*)[A-Za-z-]+").unwrap()
});

static PERMISSIONS_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(permissions:[ \t]*(?:#.*)?\r?\n)([ \t]+)?").unwrap()
});

static PERMISSIONS_INLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^permissions:[ \t]*([^#\s][^#\n]*?)[ \t]*(?:#.*)?$").unwrap()
});

static JOBS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^jobs:").unwrap());

const ADDED_PERMISSIONS: &str =
    "permissions:\n  contents: read\n  id-token: write\n\n";

#[derive(Debug, Clone, Deserialize)]
pub struct OidcPermissionsParams {
    /// Workflow path, or a bare file name under `.github/workflows/`
    pub workflow: String,
}

pub async fn compute(
    ctx: &MigrationContext<'_>,
    params: OidcPermissionsParams,
) -> Result<MigrationPlan> {
    let path = workflow_path(&params.workflow)?;

    let content = ctx
        .read(&path)
        .await?
        .ok_or_else(|| CaretakerError::not_found(format!("workflow {path}")))?;

    let changed_files = grant_id_token(&content)?
        .map(|updated| vec![ChangedFile::updated(&path, updated)])
        .unwrap_or_default();

    Ok(MigrationPlan {
        changed_files,
        commit_message: format!("ci: grant id-token write to {path}"),
        pull_request_title: format!("Enable OIDC token for {path}"),
    })
}

pub fn workflow_path(workflow: &str) -> Result<String> {
    let workflow = normalize_path(workflow);

    if workflow.is_empty() {
        return Err(CaretakerError::invalid_input("workflow is required"));
    }

    if workflow.contains('/') {
        Ok(workflow)
    } else {
        Ok(format!("{WORKFLOWS_DIR}{workflow}"))
    }
}

/// Returns the updated workflow, or `None` when it already grants
/// `id-token: write`.
pub fn grant_id_token(content: &str) -> Result<Option<String>> {
    if ID_TOKEN_WRITE_REGEX.is_match(content) {
        return Ok(None);
    }

    if ID_TOKEN_REGEX.is_match(content) {
        let updated = ID_TOKEN_REGEX
            .replace_all(content, |caps: &Captures| format!("{}write", &caps[1]));
        return Ok(Some(updated.to_string()));
    }

    if let Some(caps) = PERMISSIONS_INLINE_REGEX.captures(content) {
        let value = caps[1].trim();
        if value == "write-all" {
            return Ok(None);
        }
        return Err(CaretakerError::invalid_input(format!(
            "cannot add id-token to inline permissions: {value}"
        )));
    }

    if PERMISSIONS_BLOCK_REGEX.is_match(content) {
        let updated =
            PERMISSIONS_BLOCK_REGEX.replacen(content, 1, |caps: &Captures| {
                let existing = caps.get(2).map_or("", |m| m.as_str());
                let indent = if existing.is_empty() { "  " } else { existing };
                format!("{}{indent}id-token: write\n{existing}", &caps[1])
            });
        return Ok(Some(updated.to_string()));
    }

    let Some(jobs) = JOBS_REGEX.find(content) else {
        return Err(CaretakerError::invalid_input(
            "workflow has no jobs section",
        ));
    };

    let mut updated = String::with_capacity(content.len() + ADDED_PERMISSIONS.len());
    updated.push_str(&content[..jobs.start()]);
    updated.push_str(ADDED_PERMISSIONS);
    updated.push_str(&content[jobs.start()..]);

    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{forge::request::RepoId, test_helpers::host_with_files};

    #[test]
    fn resolves_bare_workflow_names() {
        assert_eq!(
            workflow_path("release.yml").unwrap(),
            ".github/workflows/release.yml"
        );
        assert_eq!(
            workflow_path("./.github/workflows/ci.yml").unwrap(),
            ".github/workflows/ci.yml"
        );
        assert!(workflow_path("  ").is_err());
    }

    #[test]
    fn adds_permissions_block_before_jobs() {
        let content = "name: release\non: push\n\njobs:\n  a:\n    runs-on: x\n";

        assert_eq!(
            grant_id_token(content).unwrap().unwrap(),
            "name: release\non: push\n\npermissions:\n  contents: read\n  id-token: write\n\njobs:\n  a:\n    runs-on: x\n"
        );
    }

    #[test]
    fn extends_existing_permissions_block() {
        let content = "permissions:\n    contents: write\njobs:\n  a: {}\n";

        assert_eq!(
            grant_id_token(content).unwrap().unwrap(),
            "permissions:\n    id-token: write\n    contents: write\njobs:\n  a: {}\n"
        );
    }

    #[test]
    fn upgrades_weaker_id_token_grant() {
        let content = "permissions:\n  id-token: read\njobs: {}\n";

        assert_eq!(
            grant_id_token(content).unwrap().unwrap(),
            "permissions:\n  id-token: write\njobs: {}\n"
        );
    }

    #[test]
    fn existing_grant_is_left_alone() {
        assert_eq!(
            grant_id_token("permissions:\n  id-token: write\njobs: {}\n").unwrap(),
            None
        );
        assert_eq!(
            grant_id_token("permissions: write-all\njobs: {}\n").unwrap(),
            None
        );
    }

    #[test]
    fn inline_permissions_cannot_be_merged() {
        let err = grant_id_token("permissions: read-all\njobs: {}\n").unwrap_err();
        assert!(err.to_string().contains("read-all"));
    }

    #[tokio::test]
    async fn missing_workflow_is_not_found() {
        let mock_host = host_with_files(vec![]);
        let repo = RepoId::new("acme", "widgets");
        let ctx = MigrationContext::new(&mock_host, &repo, "main");

        let err = compute(
            &ctx,
            OidcPermissionsParams {
                workflow: "release.yml".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn plans_single_workflow_change() {
        let mock_host = host_with_files(vec![(
            ".github/workflows/release.yml",
            "on: push\njobs:\n  a: {}\n",
        )]);
        let repo = RepoId::new("acme", "widgets");
        let ctx = MigrationContext::new(&mock_host, &repo, "main");

        let plan = compute(
            &ctx,
            OidcPermissionsParams {
                workflow: "release.yml".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(plan.changed_files.len(), 1);
        assert!(plan.changed_files[0].content.contains("id-token: write"));
    }
}
