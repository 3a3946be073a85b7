//! Application service — configuration handoff and stack launch.
//!
//! Transfers the freshly provisioned network identity (reserved address and
//! gateway invoke URL) into the application's remote env file, then starts
//! the container stack detached and probes its health separately. The env
//! file is fetched once, rendered locally, and uploaded once — a remote
//! observer never sees a partially updated file.

use std::io::Write as _;

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::domain::HandoffError;
use crate::domain::config::{handoff_pairs, render_env};
use crate::domain::retry::BackoffSchedule;
use crate::domain::stack::{SERVICE_ROUTES, StackState};

/// Rewrite the remote env file with the stack's resolved identity values.
///
/// Keys with no matching line are silently skipped; all other lines are
/// preserved byte for byte. Running this twice with the same state is
/// idempotent.
///
/// # Errors
///
/// Returns an error if the remote file cannot be read or the rendered file
/// cannot be uploaded.
pub async fn push_config(
    shell: &impl RemoteShell,
    state: &StackState,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("updating application configuration...");

    let fetched = shell
        .exec(&["cat", &state.env_path])
        .await
        .context("fetching remote env file")?;
    if !fetched.status.success() {
        return Err(HandoffError::FetchFailed {
            path: state.env_path.clone(),
            stderr: String::from_utf8_lossy(&fetched.stderr).into_owned(),
        }
        .into());
    }

    let content = String::from_utf8_lossy(&fetched.stdout).into_owned();
    let pairs = handoff_pairs(&SERVICE_ROUTES, &state.public_ip, &state.invoke_url);
    let rendered = render_env(&content, &pairs);

    let mut staged = tempfile::NamedTempFile::new().context("staging rendered env file")?;
    staged
        .write_all(rendered.as_bytes())
        .context("writing rendered env file")?;
    staged.flush().context("flushing rendered env file")?;

    let uploaded = shell
        .upload(staged.path(), &state.env_path)
        .await
        .context("uploading rendered env file")?;
    if !uploaded.status.success() {
        return Err(HandoffError::UploadFailed {
            path: state.env_path.clone(),
            stderr: String::from_utf8_lossy(&uploaded.stderr).into_owned(),
        }
        .into());
    }

    reporter.success("configuration updated");
    Ok(())
}

/// Start the container stack detached.
///
/// `-d` returns as soon as the containers are created; [`wait_healthy`]
/// does the actual verification.
///
/// # Errors
///
/// Returns an error if the compose invocation fails.
pub async fn launch_stack(
    shell: &impl RemoteShell,
    state: &StackState,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("starting application stack...");
    let output = shell
        .exec(&["cd", &state.app_dir, "&&", "docker", "compose", "up", "-d", "--build"])
        .await
        .context("starting application stack")?;
    if !output.status.success() {
        return Err(HandoffError::LaunchFailed {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }
    reporter.success("stack launch issued");
    Ok(())
}

/// Poll the stack's container states until everything reports `running`.
///
/// # Errors
///
/// Returns [`HandoffError::Unhealthy`] with the last observed reason when
/// the schedule is exhausted.
pub async fn wait_healthy(
    shell: &impl RemoteShell,
    state: &StackState,
    schedule: &BackoffSchedule,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("waiting for application stack to become healthy...");
    let mut last_reason = "no containers observed".to_owned();

    for attempt in 1..=schedule.max_attempts {
        match check(shell, state).await {
            HealthStatus::Healthy => {
                reporter.success("application stack healthy");
                return Ok(());
            }
            HealthStatus::Unhealthy { reason } => last_reason = reason,
            HealthStatus::Unknown => {}
        }
        if attempt < schedule.max_attempts {
            tokio::time::sleep(schedule.delay_after(attempt)).await;
        }
    }

    Err(HandoffError::Unhealthy { reason: last_reason }.into())
}

/// Health status of the remote container stack.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HealthStatus {
    Healthy,
    Unhealthy { reason: String },
    Unknown,
}

/// One health probe: every compose container must be in the `running` state.
async fn check(shell: &impl RemoteShell, state: &StackState) -> HealthStatus {
    let Ok(output) = shell
        .exec(&[
            "cd",
            &state.app_dir,
            "&&",
            "docker",
            "compose",
            "ps",
            "--format",
            "json",
        ])
        .await
    else {
        return HealthStatus::Unknown;
    };
    if !output.status.success() {
        return HealthStatus::Unknown;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut seen = 0usize;
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(container) = serde_json::from_str::<serde_json::Value>(line) else {
            return HealthStatus::Unknown;
        };
        seen += 1;
        let name = container
            .get("Service")
            .and_then(|s| s.as_str())
            .unwrap_or("?");
        let container_state = container
            .get("State")
            .and_then(|s| s.as_str())
            .unwrap_or("");
        if container_state != "running" {
            return HealthStatus::Unhealthy {
                reason: format!("{name}: {container_state}"),
            };
        }
    }

    if seen == 0 {
        HealthStatus::Unknown
    } else {
        HealthStatus::Healthy
    }
}
