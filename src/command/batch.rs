//! Apply many migration requests, one at a time, in submission order.
use log::*;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    Result,
    config::Config,
    engine::{
        MigrationEngine,
        types::{MigrationRequest, MigrationResult},
    },
    queue::TaskQueue,
};

/// Requests missing a base branch get the configured one. Requests missing
/// a commit message or title get the configured commit message.
pub async fn execute(
    engine: Arc<MigrationEngine>,
    config: &Config,
    requests: Vec<MigrationRequest>,
) -> Result<Vec<MigrationResult>> {
    let results = Arc::new(Mutex::new(Vec::with_capacity(requests.len())));
    let sink = results.clone();

    let queue = TaskQueue::spawn(move |req: MigrationRequest| {
        let engine = engine.clone();
        let sink = sink.clone();
        async move {
            let target = format!("{}/{}", req.owner, req.repo);
            let result = engine.apply(req).await;
            info!("{target}: {}", result.message);
            sink.lock().await.push(result);
            Ok(())
        }
    });

    let total = requests.len();

    for req in requests {
        queue.push(with_defaults(req, config))?;
    }

    let processed = queue.shutdown().await?;
    debug!("batch processed {processed} of {total} request(s)");

    let mut results = results.lock().await;
    Ok(std::mem::take(&mut *results))
}

fn with_defaults(mut req: MigrationRequest, config: &Config) -> MigrationRequest {
    if req.base_branch.trim().is_empty() {
        req.base_branch = config.base_branch.clone();
    }
    if req.commit_message.trim().is_empty() {
        req.commit_message = config.commit_message.clone();
    }
    if req.pull_request_title.trim().is_empty() {
        req.pull_request_title = req.commit_message.clone();
    }
    req
}
