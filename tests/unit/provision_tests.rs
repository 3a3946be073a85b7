//! Provisioning orchestration: fan-out shape, reserved-address invariant,
//! step ordering, and duplicate-stack guard.

#![allow(clippy::expect_used)]

use campus_cli::application::ports::StackStateStore;
use campus_cli::application::services::provision::{self, UpParams};
use campus_cli::domain::stack::SERVICE_ROUTES;

use crate::mocks::{
    MemorySecrets, MemoryStateStore, NullReporter, RESERVED_IP, RecordingCloud, sample_state,
};

fn params() -> UpParams<'static> {
    UpParams {
        image_id: "ami-0abcdef1234567890",
        instance_type: "t2.medium",
        subnet_id: "subnet-1",
        security_group_id: "sg-app",
        db_security_group_id: "sg-db",
        allocation_id: "eipalloc-1",
        repo_url: "https://example.com/campus/platform.git",
        db_port: 3306,
    }
}

#[tokio::test]
async fn test_provision_creates_four_integrations_and_four_routes() {
    let cloud = RecordingCloud::new();
    let state_mgr = MemoryStateStore::empty();
    provision::provision_stack(&cloud, &MemorySecrets::new(), &state_mgr, &NullReporter, &params())
        .await
        .expect("provision");

    let integrations = cloud.integrations.lock().expect("lock");
    let routes = cloud.routes.lock().expect("lock");
    assert_eq!(integrations.len(), 4);
    assert_eq!(routes.len(), 4);
    for route in &SERVICE_ROUTES {
        assert!(
            routes
                .iter()
                .any(|(key, _)| key == &format!("ANY /{}/{{proxy+}}", route.name)),
            "missing route for {}",
            route.name
        );
    }
}

#[tokio::test]
async fn test_each_route_resolves_to_its_declared_backend_port() {
    let cloud = RecordingCloud::new();
    provision::provision_stack(
        &cloud,
        &MemorySecrets::new(),
        &MemoryStateStore::empty(),
        &NullReporter,
        &params(),
    )
    .await
    .expect("provision");

    let integrations = cloud.integrations.lock().expect("lock");
    let routes = cloud.routes.lock().expect("lock");
    for route in &SERVICE_ROUTES {
        let (_, integration_id) = routes
            .iter()
            .find(|(key, _)| key == &route.route_key())
            .expect("route present");
        // RecordingCloud hands out ids "int-<n>" in creation order.
        let index: usize = integration_id
            .strip_prefix("int-")
            .expect("id format")
            .parse()
            .expect("index");
        let uri = &integrations[index - 1];
        assert!(
            uri.contains(&format!(":{}/", route.port)),
            "route {} must target port {}, got {uri}",
            route.name,
            route.port
        );
    }
}

#[tokio::test]
async fn test_integrations_target_reserved_address_never_ephemeral() {
    let cloud = RecordingCloud::new();
    let state_mgr = MemoryStateStore::empty();
    let state = provision::provision_stack(
        &cloud,
        &MemorySecrets::new(),
        &state_mgr,
        &NullReporter,
        &params(),
    )
    .await
    .expect("provision");

    assert_eq!(state.public_ip, RESERVED_IP);
    for uri in cloud.integrations.lock().expect("lock").iter() {
        assert!(
            uri.contains(RESERVED_IP),
            "integration must target the reserved address: {uri}"
        );
    }
}

#[tokio::test]
async fn test_address_bound_before_gateway_fanout() {
    let cloud = RecordingCloud::new();
    provision::provision_stack(
        &cloud,
        &MemorySecrets::new(),
        &MemoryStateStore::empty(),
        &NullReporter,
        &params(),
    )
    .await
    .expect("provision");

    let bind = cloud.op_index("associate_address").expect("bind recorded");
    let first_integration = cloud
        .op_index("create_integration")
        .expect("integration recorded");
    assert!(
        bind < first_integration,
        "no traffic may be routed before the address is bound"
    );
}

#[tokio::test]
async fn test_db_rule_uses_instance_private_address() {
    let cloud = RecordingCloud::new();
    provision::provision_stack(
        &cloud,
        &MemorySecrets::new(),
        &MemoryStateStore::empty(),
        &NullReporter,
        &params(),
    )
    .await
    .expect("provision");

    let ops = cloud.ops.lock().expect("lock");
    assert!(
        ops.iter()
            .any(|op| op == "authorize_ingress sg-db 3306 10.0.1.17/32"),
        "ingress must come from the private address /32: {ops:?}"
    );
}

#[tokio::test]
async fn test_provision_persists_state_with_outputs() {
    let cloud = RecordingCloud::new();
    let state_mgr = MemoryStateStore::empty();
    provision::provision_stack(&cloud, &MemorySecrets::new(), &state_mgr, &NullReporter, &params())
        .await
        .expect("provision");

    let saved = state_mgr
        .load_async()
        .await
        .expect("load")
        .expect("state saved");
    assert_eq!(saved.public_ip, RESERVED_IP);
    assert_eq!(saved.invoke_url, crate::mocks::INVOKE_URL);
    assert_eq!(saved.app_dir, "/home/ubuntu/platform");
    assert_eq!(saved.env_path, "/home/ubuntu/platform/.env");
}

#[tokio::test]
async fn test_provision_refuses_when_stack_already_exists() {
    let cloud = RecordingCloud::new();
    let state_mgr = MemoryStateStore::with_state(sample_state());
    let err = provision::provision_stack(
        &cloud,
        &MemorySecrets::new(),
        &state_mgr,
        &NullReporter,
        &params(),
    )
    .await
    .expect_err("second up must refuse");
    assert!(err.to_string().contains("already exists"), "{err}");
    assert!(cloud.ops.lock().expect("lock").is_empty(), "no cloud calls made");
}
