//! Application service — `campus down` teardown use-case.
//!
//! Destroys resources in reverse dependency order so nothing is removed
//! while something else still references it. Each cloud failure is fatal
//! and surfaced immediately; re-running `campus down` after fixing the
//! cause is the recovery path.

use anyhow::{Context, Result};

use crate::application::ports::{CloudApi, LocalSecrets, ProgressReporter, StackStateStore};
use crate::domain::StackState;

/// Tear the stack down and clear local state.
///
/// # Errors
///
/// Returns an error if any destroy step fails; state is only cleared after
/// every remote resource is gone.
pub async fn teardown_stack(
    cloud: &impl CloudApi,
    secrets: &impl LocalSecrets,
    state_mgr: &impl StackStateStore,
    reporter: &impl ProgressReporter,
    state: &StackState,
) -> Result<()> {
    reporter.step("deleting gateway...");
    cloud
        .delete_http_api(&state.api_id)
        .await
        .context("deleting HTTP API")?;
    reporter.success("gateway deleted");

    reporter.step("releasing reserved address...");
    cloud
        .disassociate_address(&state.association_id)
        .await
        .context("releasing address binding")?;
    reporter.success("address binding released");

    reporter.step("revoking database access...");
    let source_cidr = format!("{}/32", state.private_ip);
    cloud
        .revoke_ingress(&state.db_security_group_id, state.db_port, &source_cidr)
        .await
        .context("revoking database ingress")?;
    reporter.success("database access revoked");

    reporter.step("terminating instance...");
    cloud
        .terminate_instance(&state.instance_id)
        .await
        .context("terminating instance")?;
    cloud
        .wait_terminated(&state.instance_id)
        .await
        .context("waiting for termination")?;
    reporter.success(&format!("instance {} terminated", state.instance_id));

    reporter.step("deleting keypair...");
    cloud
        .delete_key_pair(&state.key_name)
        .await
        .context("deleting keypair")?;
    secrets.clear().await.context("removing local key material")?;
    reporter.success("keypair deleted");

    state_mgr.clear_async().await.context("clearing stack state")?;
    Ok(())
}
