//! Common functionality shared between commands
use log::*;
use serde::de::DeserializeOwned;
use std::{path::Path, sync::Arc};

use crate::{
    CaretakerError, Result,
    channel::{InProcessChannel, MigrationChannel, ProcessChannel},
    config::Config,
    engine::{MigrationEngine, types::MigrationResult},
    forge::traits::GitHost,
    reporter::LogReporter,
};

/// Read and deserialize a JSON input file.
pub async fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CaretakerError::InvalidArgs(format!(
            "failed to read {}: {e}",
            path.display()
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}

pub fn create_engine(host: Arc<dyn GitHost>, config: &Config) -> MigrationEngine {
    MigrationEngine::new(host, Arc::new(LogReporter), config.engine_options())
}

/// Worker process channel when a worker program is configured, in-process
/// computation otherwise.
pub fn create_channel(
    host: Arc<dyn GitHost>,
    config: &Config,
) -> Box<dyn MigrationChannel> {
    match &config.worker.program {
        Some(program) => {
            debug!("using worker process: {program}");
            Box::new(ProcessChannel::new(
                program,
                config.worker.args.clone(),
                config.worker.retry_policy(),
            ))
        }
        None => Box::new(InProcessChannel::new(host)),
    }
}

/// JSON for stdout: a single object for one result, an array otherwise.
pub fn render_results(results: &[MigrationResult]) -> Result<String> {
    match results {
        [result] => Ok(serde_json::to_string_pretty(result)?),
        _ => Ok(serde_json::to_string_pretty(results)?),
    }
}

pub fn any_failed(results: &[MigrationResult]) -> bool {
    results.iter().any(MigrationResult::is_error)
}
