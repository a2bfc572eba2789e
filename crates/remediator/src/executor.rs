//! Dual-path command executor: structured Kubernetes API calls with a
//! kubectl fallback.
//!
//! Every `Scale`/`Restart` request is a two-step attempt list: the structured
//! call first, then an equivalent kubectl invocation if the structured call
//! fails for any reason (including the cluster client being unavailable).
//! `RawCommand` requests only ever run on the fallback path; the text is
//! lexed into an argument vector and never handed to a shell interpreter.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, Patch, PatchParams};
use serde_json::json;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::policy::ActionRequest;

/// All remediation targets live in one fixed namespace.
pub const NAMESPACE: &str = "default";

/// Timeout for structured cluster calls.
const CLUSTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for fallback command invocations.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Normalized outcome of one remediation attempt.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// True only if the structured call was accepted or the fallback command
    /// exited zero.
    pub success: bool,
    /// Human-readable summary for the notification message.
    pub summary: String,
    /// Raw execution output (combined stdout/stderr or API error text).
    pub output: String,
}

impl ActionOutcome {
    fn ok(summary: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            summary: summary.into(),
            output: output.into(),
        }
    }

    fn failed(summary: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: summary.into(),
            output: output.into(),
        }
    }
}

/// Runs remediation actions against the cluster.
pub struct CommandExecutor {
    /// Structured API client; `None` means every structured attempt fails
    /// fast into the kubectl fallback.
    client: Option<kube::Client>,
}

impl CommandExecutor {
    /// Create an executor. Pass `None` when no cluster client is available.
    #[must_use]
    pub fn new(client: Option<kube::Client>) -> Self {
        Self { client }
    }

    /// Execute one action request and return a normalized outcome.
    ///
    /// Never returns an error: execution failures are encoded in the outcome
    /// and reported to the operator, not retried at this layer.
    pub async fn execute(&self, request: &ActionRequest) -> ActionOutcome {
        match request {
            ActionRequest::Scale { target, replicas } => self.scale(target, *replicas).await,
            ActionRequest::Restart { target } => self.restart(target).await,
            ActionRequest::RawCommand { text } => self.raw_command(text).await,
        }
    }

    async fn scale(&self, target: &str, replicas: u32) -> ActionOutcome {
        let summary = format!("✅ Auto-scaled deployment `{target}` to {replicas} replicas.");

        match self.scale_structured(target, replicas).await {
            Ok(()) => {
                info!(target, replicas, "Scaled deployment via API");
                ActionOutcome::ok(summary, String::new())
            }
            Err(e) => {
                warn!(target, error = %e, "Structured scale failed, falling back to kubectl");
                let argv = vec![
                    "kubectl".to_string(),
                    "scale".to_string(),
                    format!("deployment/{target}"),
                    format!("--replicas={replicas}"),
                    "-n".to_string(),
                    NAMESPACE.to_string(),
                ];
                match self.run_argv(&argv).await {
                    (true, output) => ActionOutcome::ok(summary, output),
                    (false, output) => ActionOutcome::failed(
                        format!("⚠️ Failed to scale deployment `{target}`: {output}"),
                        output,
                    ),
                }
            }
        }
    }

    async fn restart(&self, target: &str) -> ActionOutcome {
        let summary = format!("🔁 Restarted deployment `{target}`.");

        match self.restart_structured(target).await {
            Ok(()) => {
                info!(target, "Restarted deployment via API");
                ActionOutcome::ok(summary, String::new())
            }
            Err(e) => {
                warn!(target, error = %e, "Structured restart failed, falling back to kubectl");
                let argv = vec![
                    "kubectl".to_string(),
                    "rollout".to_string(),
                    "restart".to_string(),
                    format!("deployment/{target}"),
                    "-n".to_string(),
                    NAMESPACE.to_string(),
                ];
                match self.run_argv(&argv).await {
                    (true, output) => ActionOutcome::ok(summary, output),
                    (false, output) => ActionOutcome::failed(
                        format!("⚠️ Failed to restart deployment `{target}`: {output}"),
                        output,
                    ),
                }
            }
        }
    }

    /// Raw directives run verbatim on the fallback path only. Upgrading them
    /// to a structured call would mean trusting unparsed model output.
    async fn raw_command(&self, text: &str) -> ActionOutcome {
        let argv = match shell_words::split(text) {
            Ok(argv) => argv,
            Err(e) => {
                warn!(error = %e, "Raw directive could not be lexed");
                return ActionOutcome::failed(
                    format!("⚠️ AUTO action could not be parsed: {e}"),
                    e.to_string(),
                );
            }
        };

        if argv.is_empty() {
            return ActionOutcome::failed("⚠️ AUTO action is empty.", String::new());
        }

        match self.run_argv(&argv).await {
            (true, output) => {
                ActionOutcome::ok(format!("✅ Ran AUTO action: {text}"), output)
            }
            (false, output) => ActionOutcome::failed(
                format!("⚠️ AUTO action failed: {output}"),
                output,
            ),
        }
    }

    /// Patch the replica count on the deployment's scale subresource.
    async fn scale_structured(&self, target: &str, replicas: u32) -> Result<()> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| anyhow!("no cluster client available"))?;
        let deployments: Api<Deployment> = Api::namespaced(client, NAMESPACE);
        let patch = json!({ "spec": { "replicas": replicas } });

        tokio::time::timeout(
            CLUSTER_TIMEOUT,
            deployments.patch_scale(target, &PatchParams::default(), &Patch::Merge(&patch)),
        )
        .await
        .context("structured scale call timed out")?
        .context("structured scale call failed")?;

        Ok(())
    }

    /// Signal a rolling restart by patching a timestamp annotation on the pod
    /// template, the same mechanism `kubectl rollout restart` uses. Desired
    /// state is otherwise untouched.
    async fn restart_structured(&self, target: &str) -> Result<()> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| anyhow!("no cluster client available"))?;
        let deployments: Api<Deployment> = Api::namespaced(client, NAMESPACE);
        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            "kubectl.kubernetes.io/restartedAt": Utc::now().to_rfc3339(),
                        }
                    }
                }
            }
        });

        tokio::time::timeout(
            CLUSTER_TIMEOUT,
            deployments.patch(target, &PatchParams::default(), &Patch::Merge(&patch)),
        )
        .await
        .context("structured restart call timed out")?
        .context("structured restart call failed")?;

        Ok(())
    }

    /// Run a command from discrete argument tokens, capturing combined
    /// stdout/stderr. Returns `(exited_zero, combined_output)`.
    async fn run_argv(&self, argv: &[String]) -> (bool, String) {
        info!(command = %argv.join(" "), "Running fallback command");

        let result = tokio::time::timeout(
            COMMAND_TIMEOUT,
            Command::new(&argv[0]).args(&argv[1..]).output(),
        )
        .await;

        match result {
            Err(_) => (
                false,
                format!("command timed out after {}s", COMMAND_TIMEOUT.as_secs()),
            ),
            Ok(Err(e)) => (false, format!("failed to run command: {e}")),
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                debug!(
                    status = %output.status,
                    output = %combined.trim_end(),
                    "Fallback command finished"
                );
                (output.status.success(), combined)
            }
        }
    }
}
