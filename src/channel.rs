//! Request/response transport between the engine driver and migration
//! computation. Migrations run either in-process through the catalog or in a
//! separate worker process speaking JSON over stdin/stdout.
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{process::Stdio, sync::Arc};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{
    CaretakerError, Result,
    catalog::{self, MigrationContext, MigrationId, MigrationPlan},
    forge::{request::RepoId, traits::GitHost},
    retry::RetryPolicy,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub command: MigrationId,
    pub repo: RepoId,
    /// Branch to read the repository at
    pub git_ref: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub plan: MigrationPlan,
}

#[async_trait]
pub trait MigrationChannel: Send + Sync {
    async fn invoke(&self, req: WorkerRequest) -> Result<WorkerResponse>;
}

/// Computes migrations in the calling process.
pub struct InProcessChannel {
    host: Arc<dyn GitHost>,
}

impl InProcessChannel {
    pub fn new(host: Arc<dyn GitHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl MigrationChannel for InProcessChannel {
    async fn invoke(&self, req: WorkerRequest) -> Result<WorkerResponse> {
        let ctx =
            MigrationContext::new(self.host.as_ref(), &req.repo, &req.git_ref);
        let plan = catalog::compute(req.command, &ctx, req.params).await?;
        Ok(WorkerResponse { plan })
    }
}

/// Runs each request in a fresh worker process: the request JSON goes to
/// stdin and the response JSON is read from stdout.
pub struct ProcessChannel {
    program: String,
    args: Vec<String>,
    retry: RetryPolicy,
}

impl ProcessChannel {
    pub fn new(program: impl Into<String>, args: Vec<String>, retry: RetryPolicy) -> Self {
        Self {
            program: program.into(),
            args,
            retry,
        }
    }

    async fn spawn_once(&self, payload: &[u8]) -> Result<WorkerResponse> {
        debug!("spawning worker: {} {}", self.program, self.args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CaretakerError::Worker(format!(
                    "failed to start {}: {e}",
                    self.program
                ))
            })?;

        // a worker that exits early closes the pipe; its stderr explains why
        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(payload).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(CaretakerError::Worker(format!(
                "{} exited with {}: {stderr}",
                self.program, output.status
            )));
        }

        if let Err(e) = written {
            return Err(CaretakerError::Worker(format!(
                "failed to send request to {}: {e}: {stderr}",
                self.program
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl MigrationChannel for ProcessChannel {
    async fn invoke(&self, req: WorkerRequest) -> Result<WorkerResponse> {
        let payload = serde_json::to_vec(&req)?;
        info!("dispatching {} for {} to worker process", req.command, req.repo);
        self.retry.run(|| self.spawn_once(&payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::types::ChangedFile, test_helpers::host_with_files};
    use serde_json::json;
    use std::time::Duration;

    fn request(command: MigrationId, params: Value) -> WorkerRequest {
        WorkerRequest {
            command,
            repo: RepoId::new("acme", "widgets"),
            git_ref: "main".into(),
            params,
        }
    }

    fn shell(script: &str, retry: RetryPolicy) -> ProcessChannel {
        ProcessChannel::new(
            "sh",
            vec!["-c".into(), script.into()],
            retry,
        )
    }

    #[test]
    fn request_wire_format() {
        let req = request(MigrationId::NodeVersion, json!({"version": "20"}));

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "command": "node-version",
                "repo": {"owner": "acme", "repo": "widgets"},
                "gitRef": "main",
                "params": {"version": "20"}
            })
        );
    }

    #[tokio::test]
    async fn in_process_channel_computes_through_catalog() {
        let mock_host = host_with_files(vec![(".nvmrc", "18\n")]);
        let channel = InProcessChannel::new(Arc::new(mock_host));

        let response = channel
            .invoke(request(MigrationId::NodeVersion, json!({"version": "20"})))
            .await
            .unwrap();

        assert_eq!(
            response.plan.changed_files,
            vec![ChangedFile::updated(".nvmrc", "20\n")]
        );
    }

    #[tokio::test]
    async fn process_channel_reads_response_from_stdout() {
        let channel = shell(
            r#"cat > /dev/null; echo '{"plan":{"changedFiles":[{"path":"a.txt","content":"a"}],"commitMessage":"m","pullRequestTitle":"t"}}'"#,
            RetryPolicy::none(),
        );

        let response = channel
            .invoke(request(MigrationId::RunnerOs, Value::Null))
            .await
            .unwrap();

        assert_eq!(
            response.plan.changed_files,
            vec![ChangedFile::write("a.txt", "a")]
        );
        assert_eq!(response.plan.commit_message, "m");
    }

    #[tokio::test]
    async fn worker_receives_request_on_stdin() {
        let channel = shell(
            r#"grep -q '"command":"oidc-permissions"' && echo '{"plan":{"changedFiles":[],"commitMessage":"ok","pullRequestTitle":"ok"}}'"#,
            RetryPolicy::none(),
        );

        let response = channel
            .invoke(request(MigrationId::OidcPermissions, Value::Null))
            .await
            .unwrap();

        assert_eq!(response.plan.commit_message, "ok");
    }

    #[tokio::test]
    async fn non_zero_exit_is_worker_error_with_stderr() {
        let channel = shell(
            "cat > /dev/null; echo 'boom' >&2; exit 3",
            RetryPolicy::none(),
        );

        let err = channel
            .invoke(request(MigrationId::RunnerOs, Value::Null))
            .await
            .unwrap_err();

        match err {
            CaretakerError::Worker(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn worker_exiting_before_reading_stdin_reports_stderr() {
        let channel = shell(
            "echo 'npm ERR! code ETARGET' >&2; exit 1",
            RetryPolicy::version_not_found(2, Duration::from_millis(1)),
        );

        let err = channel
            .invoke(request(
                MigrationId::NodeVersion,
                json!({"padding": "x".repeat(256 * 1024)}),
            ))
            .await
            .unwrap_err();

        match err {
            CaretakerError::Worker(message) => {
                assert!(message.contains("ETARGET"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_version_not_found_failures() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("attempts");
        let script = format!(
            "cat > /dev/null; echo x >> '{}'; echo 'npm ERR! code ETARGET' >&2; exit 1",
            counter.display()
        );
        let channel = shell(
            &script,
            RetryPolicy::version_not_found(3, Duration::from_millis(1)),
        );

        let err = channel
            .invoke(request(MigrationId::NodeVersion, Value::Null))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("ETARGET"));
        let attempts = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(attempts.lines().count(), 3);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("attempts");
        let script = format!(
            "cat > /dev/null; echo x >> '{}'; echo 'EACCES' >&2; exit 1",
            counter.display()
        );
        let channel = shell(
            &script,
            RetryPolicy::version_not_found(3, Duration::from_millis(1)),
        );

        assert!(
            channel
                .invoke(request(MigrationId::NodeVersion, Value::Null))
                .await
                .is_err()
        );
        let attempts = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(attempts.lines().count(), 1);
    }
}
