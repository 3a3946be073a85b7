//! Teardown ordering and local cleanup.

#![allow(clippy::expect_used)]

use std::sync::atomic::Ordering;

use campus_cli::application::ports::StackStateStore;
use campus_cli::application::services::teardown;

use crate::mocks::{MemorySecrets, MemoryStateStore, NullReporter, RecordingCloud, sample_state};

#[tokio::test]
async fn test_teardown_destroys_in_reverse_dependency_order() {
    let cloud = RecordingCloud::new();
    let secrets = MemorySecrets::new();
    let state_mgr = MemoryStateStore::with_state(sample_state());
    teardown::teardown_stack(&cloud, &secrets, &state_mgr, &NullReporter, &sample_state())
        .await
        .expect("teardown");

    let api = cloud.op_index("delete_http_api").expect("api deleted");
    let unbind = cloud.op_index("disassociate_address").expect("unbound");
    let revoke = cloud.op_index("revoke_ingress").expect("revoked");
    let terminate = cloud.op_index("terminate_instance").expect("terminated");
    let key = cloud.op_index("delete_key_pair").expect("key deleted");
    assert!(api < unbind && unbind < revoke && revoke < terminate && terminate < key);
}

#[tokio::test]
async fn test_teardown_clears_local_state_and_secrets() {
    let cloud = RecordingCloud::new();
    let secrets = MemorySecrets::new();
    let state_mgr = MemoryStateStore::with_state(sample_state());
    teardown::teardown_stack(&cloud, &secrets, &state_mgr, &NullReporter, &sample_state())
        .await
        .expect("teardown");

    assert!(secrets.cleared.load(Ordering::SeqCst));
    assert!(state_mgr.load_async().await.expect("load").is_none());
}

#[tokio::test]
async fn test_teardown_revokes_the_rule_it_authorized() {
    let cloud = RecordingCloud::new();
    let state = sample_state();
    teardown::teardown_stack(
        &cloud,
        &MemorySecrets::new(),
        &MemoryStateStore::with_state(state.clone()),
        &NullReporter,
        &state,
    )
    .await
    .expect("teardown");

    let ops = cloud.ops.lock().expect("lock");
    assert!(
        ops.iter()
            .any(|op| op == "revoke_ingress sg-db 3306 10.0.1.17/32"),
        "revocation must mirror the authorized rule: {ops:?}"
    );
}
