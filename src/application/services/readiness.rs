//! Application service — readiness polling.
//!
//! The boot script has no programmatic completion signal other than the
//! marker file it writes last, so the only way to know the instance is
//! ready is to keep asking. The loop is bounded (see `BackoffSchedule`);
//! exhausting it is an explicit error, never an indefinite hang.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::domain::ReadinessError;
use crate::domain::retry::BackoffSchedule;

/// Block until the instance's boot marker exists.
///
/// Waits the schedule's grace period first, then probes `test -f <marker>`
/// with exponentially growing delays. The first successful contact also
/// pins the host key, so no mutating session ever runs unverified. Retries
/// are deliberately error-unaware: an unreachable host and an absent
/// marker both count as one failed attempt.
///
/// Returns the pinned host key's SHA-256 fingerprint. Idempotent; safe to
/// re-run against a ready instance.
///
/// # Errors
///
/// Returns [`ReadinessError::TimedOut`] when every attempt fails.
pub async fn wait_for_boot(
    shell: &impl RemoteShell,
    marker: &str,
    schedule: &BackoffSchedule,
    reporter: &impl ProgressReporter,
) -> Result<String> {
    reporter.step("waiting for instance to finish initializing...");
    tokio::time::sleep(schedule.grace).await;

    let mut pinned = shell.is_pinned();
    let mut fingerprint: Option<String> = None;
    for attempt in 1..=schedule.max_attempts {
        if !pinned {
            match shell.pin_host_key().await {
                Ok(fp) => {
                    reporter.success(&format!("host key pinned (SHA256:{fp})"));
                    fingerprint = Some(fp);
                    pinned = true;
                }
                Err(_) => {
                    // Host not answering yet — same treatment as an absent
                    // marker.
                    tokio::time::sleep(schedule.delay_after(attempt)).await;
                    continue;
                }
            }
        }

        match shell.exec(&["test", "-f", marker]).await {
            Ok(output) if output.status.success() => {
                reporter.success("instance initialization complete");
                return Ok(fingerprint.unwrap_or_default());
            }
            _ => {
                if attempt < schedule.max_attempts {
                    reporter.step(&format!(
                        "not ready yet (check {attempt}/{})...",
                        schedule.max_attempts
                    ));
                }
                tokio::time::sleep(schedule.delay_after(attempt)).await;
            }
        }
    }

    Err(ReadinessError::TimedOut {
        attempts: schedule.max_attempts,
        waited_secs: schedule.total_budget().as_secs(),
        marker: marker.to_owned(),
    }
    .into())
}
