//! Readiness poller behavior: bounded retries, pin-before-probe, and the
//! safety property that no handoff mutation happens before the marker
//! appears.

#![allow(clippy::expect_used)]

use std::sync::atomic::Ordering;

use campus_cli::application::ports::RemoteShell;
use campus_cli::application::services::{handoff, readiness};
use campus_cli::domain::retry::BackoffSchedule;

use crate::mocks::{NullReporter, ScriptedShell, sample_state};

const MARKER: &str = "/home/ubuntu/.bootstrap-complete";

#[tokio::test]
async fn test_poller_succeeds_once_marker_appears() {
    let shell = ScriptedShell::with_marker_ready_after(Some(2));
    let schedule = BackoffSchedule::immediate(10);
    let fingerprint = readiness::wait_for_boot(&shell, MARKER, &schedule, &NullReporter)
        .await
        .expect("marker appears within budget");
    assert_eq!(fingerprint, "deadbeef");
    assert_eq!(shell.probes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_poller_times_out_when_marker_never_appears() {
    let shell = ScriptedShell::never_ready();
    let schedule = BackoffSchedule::immediate(5);
    let err = readiness::wait_for_boot(&shell, MARKER, &schedule, &NullReporter)
        .await
        .expect_err("bounded loop must give up");
    assert!(err.to_string().contains("5 checks"), "{err}");
    assert_eq!(shell.probes.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_poller_counts_unreachable_host_as_failed_attempt() {
    // Pin fails twice (host still booting), then the marker is immediately
    // present. Retries are error-unaware: probes only start after pinning.
    let shell = ScriptedShell::ready();
    shell.pin_failures.store(2, Ordering::SeqCst);
    let schedule = BackoffSchedule::immediate(10);
    readiness::wait_for_boot(&shell, MARKER, &schedule, &NullReporter)
        .await
        .expect("recovers after host answers");
    assert!(shell.is_pinned());
    assert_eq!(shell.probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_poller_pin_failures_consume_the_attempt_budget() {
    let shell = ScriptedShell::ready();
    shell.pin_failures.store(3, Ordering::SeqCst);
    let schedule = BackoffSchedule::immediate(3);
    let err = readiness::wait_for_boot(&shell, MARKER, &schedule, &NullReporter)
        .await
        .expect_err("budget exhausted before pinning succeeds");
    assert!(err.to_string().contains("3 checks"), "{err}");
    // No probe ever ran unpinned.
    assert_eq!(shell.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_mutation_issued_while_marker_absent() {
    // Safety property: the handoff only runs after the poller reports
    // success, so an instance that never finishes booting never sees a
    // config fetch, an upload, or a compose invocation.
    let shell = ScriptedShell::never_ready().with_remote_env("PUBLIC_IP=old\n");
    let schedule = BackoffSchedule::immediate(4);
    let state = sample_state();
    let reporter = NullReporter;

    let ready = readiness::wait_for_boot(&shell, MARKER, &schedule, &reporter).await;
    if ready.is_ok() {
        handoff::push_config(&shell, &state, &reporter)
            .await
            .expect("push");
    }

    assert!(ready.is_err());
    assert!(
        shell.probes.load(Ordering::SeqCst) >= 3,
        "poll loop must keep retrying across failed checks"
    );
    assert!(shell.uploads.lock().expect("lock").is_empty());
    let commands = shell.commands.lock().expect("lock");
    assert!(
        commands.iter().all(|c| c.starts_with("test -f")),
        "only read-only marker probes allowed, saw: {commands:?}"
    );
}
