//! Configuration handoff: single batched upload, idempotence, detached
//! launch, and health probing.

#![allow(clippy::expect_used)]

use campus_cli::application::services::handoff;
use campus_cli::domain::retry::BackoffSchedule;

use crate::mocks::{INVOKE_URL, NullReporter, RESERVED_IP, ScriptedShell, sample_state};

#[tokio::test]
async fn test_push_config_uploads_rendered_file_once() {
    let shell = ScriptedShell::ready()
        .with_remote_env("PUBLIC_IP=old\nADMIN_SERVICE_URL=http://stale\nDB_NAME=campus\n");
    handoff::push_config(&shell, &sample_state(), &NullReporter)
        .await
        .expect("push");

    let uploads = shell.uploads.lock().expect("lock");
    assert_eq!(uploads.len(), 1, "exactly one batched transfer");
    assert_eq!(
        uploads[0],
        format!("PUBLIC_IP={RESERVED_IP}\nADMIN_SERVICE_URL={INVOKE_URL}\nDB_NAME=campus\n")
    );
}

#[tokio::test]
async fn test_push_config_replaces_address_and_keeps_other_lines() {
    let shell = ScriptedShell::ready().with_remote_env("# config\nPUBLIC_IP=old\nSECRET=x\n");
    handoff::push_config(&shell, &sample_state(), &NullReporter)
        .await
        .expect("push");
    let remote = shell.remote_env.lock().expect("lock").clone();
    assert_eq!(remote, format!("# config\nPUBLIC_IP={RESERVED_IP}\nSECRET=x\n"));
}

#[tokio::test]
async fn test_push_config_twice_is_idempotent() {
    let shell = ScriptedShell::ready()
        .with_remote_env("PUBLIC_IP=old\nCOURSES_SERVICE_URL=http://stale\n");
    let state = sample_state();
    handoff::push_config(&shell, &state, &NullReporter)
        .await
        .expect("first push");
    let after_first = shell.remote_env.lock().expect("lock").clone();
    handoff::push_config(&shell, &state, &NullReporter)
        .await
        .expect("second push");
    let after_second = shell.remote_env.lock().expect("lock").clone();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_push_config_absent_key_is_silent_noop() {
    let shell = ScriptedShell::ready().with_remote_env("DB_NAME=campus\n");
    handoff::push_config(&shell, &sample_state(), &NullReporter)
        .await
        .expect("absent keys must not error");
    let remote = shell.remote_env.lock().expect("lock").clone();
    assert_eq!(remote, "DB_NAME=campus\n");
}

#[tokio::test]
async fn test_launch_stack_detaches_with_compose_up() {
    let shell = ScriptedShell::ready();
    handoff::launch_stack(&shell, &sample_state(), &NullReporter)
        .await
        .expect("launch");
    let commands = shell.commands.lock().expect("lock");
    let launch = commands
        .iter()
        .find(|c| c.contains("compose up"))
        .expect("compose invocation");
    assert!(launch.contains("cd /home/ubuntu/platform"));
    assert!(launch.contains("-d"), "launch must not block: {launch}");
    assert!(launch.contains("--build"));
}

#[tokio::test]
async fn test_wait_healthy_succeeds_when_all_containers_run() {
    let shell = ScriptedShell::ready();
    *shell.ps_responses.lock().expect("lock") = vec![
        "{\"Service\":\"admin\",\"State\":\"running\"}\n{\"Service\":\"courses\",\"State\":\"running\"}"
            .to_owned(),
    ];
    handoff::wait_healthy(
        &shell,
        &sample_state(),
        &BackoffSchedule::immediate(3),
        &NullReporter,
    )
    .await
    .expect("healthy");
}

#[tokio::test]
async fn test_wait_healthy_retries_until_containers_come_up() {
    let shell = ScriptedShell::ready();
    *shell.ps_responses.lock().expect("lock") = vec![
        r#"{"Service":"admin","State":"restarting"}"#.to_owned(),
        r#"{"Service":"admin","State":"restarting"}"#.to_owned(),
        r#"{"Service":"admin","State":"running"}"#.to_owned(),
    ];
    handoff::wait_healthy(
        &shell,
        &sample_state(),
        &BackoffSchedule::immediate(5),
        &NullReporter,
    )
    .await
    .expect("eventually healthy");
}

#[tokio::test]
async fn test_wait_healthy_reports_last_reason_on_exhaustion() {
    let shell = ScriptedShell::ready();
    *shell.ps_responses.lock().expect("lock") =
        vec![r#"{"Service":"learning","State":"exited"}"#.to_owned()];
    let err = handoff::wait_healthy(
        &shell,
        &sample_state(),
        &BackoffSchedule::immediate(2),
        &NullReporter,
    )
    .await
    .expect_err("never healthy");
    assert!(err.to_string().contains("learning: exited"), "{err}");
}
