//! Worker side of the process channel: one request in on stdin, one
//! response out on stdout.
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    Result,
    channel::{MigrationChannel, WorkerRequest, WorkerResponse},
};

pub async fn execute<R: AsyncRead + Unpin>(
    channel: &dyn MigrationChannel,
    mut input: R,
) -> Result<WorkerResponse> {
    let mut raw = String::new();
    input.read_to_string(&mut raw).await?;

    let req: WorkerRequest = serde_json::from_str(&raw)?;
    channel.invoke(req).await
}
