use futures_util::future::try_join_all;
use log::*;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::{
    CaretakerError, Result,
    catalog::{MigrationContext, MigrationPlan},
    engine::types::ChangedFile,
};

pub const WORKFLOWS_DIR: &str = ".github/workflows/";

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerOsParams {
    /// Runner label to replace, e.g. `ubuntu-20.04`
    pub from: String,
    /// Replacement label
    pub to: String,
}

pub async fn compute(
    ctx: &MigrationContext<'_>,
    params: RunnerOsParams,
) -> Result<MigrationPlan> {
    if params.from.trim().is_empty() || params.to.trim().is_empty() {
        return Err(CaretakerError::invalid_input(
            "runner-os needs both from and to",
        ));
    }

    let runs_on = runs_on_regex(&params.from)?;

    let workflows = ctx
        .list_files()
        .await?
        .into_iter()
        .filter(|path| is_workflow(path))
        .collect::<Vec<String>>();

    debug!("found {} workflow file(s) in {}", workflows.len(), ctx.repo);

    let contents = try_join_all(workflows.iter().map(|path| ctx.read(path))).await?;

    let changed_files = workflows
        .into_iter()
        .zip(contents)
        .filter_map(|(path, content)| {
            let content = content?;
            let updated = replace_runner(&runs_on, &content, &params.to);
            (updated != content).then(|| ChangedFile::updated(path, updated))
        })
        .collect();

    Ok(MigrationPlan {
        changed_files,
        commit_message: format!(
            "ci: move runners from {} to {}",
            params.from, params.to
        ),
        pull_request_title: format!(
            "Move CI runners from {} to {}",
            params.from, params.to
        ),
    })
}

pub fn is_workflow(path: &str) -> bool {
    path.strip_prefix(WORKFLOWS_DIR).is_some_and(|name| {
        !name.contains('/') && (name.ends_with(".yml") || name.ends_with(".yaml"))
    })
}

fn runs_on_regex(from: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r#"(?m)^([ \t]*runs-on:[ \t]*)(["']?){}(["']?)([ \t]*(?:#.*)?)$"#,
        regex::escape(from.trim())
    ))?)
}

fn replace_runner(runs_on: &Regex, content: &str, to: &str) -> String {
    runs_on
        .replace_all(content, |caps: &Captures| {
            format!("{}{}{}{}{}", &caps[1], &caps[2], to.trim(), &caps[3], &caps[4])
        })
        .to_string()
}
