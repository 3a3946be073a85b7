//! Application service — `campus up` provisioning use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits. The linear dependency
//! chain (keypair → instance → address binding → access rule) is encoded
//! directly in the step order; the gateway fan-out only needs the reserved
//! address, so it runs after binding and before the access rule.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::{
    CloudApi, InstanceSpec, LocalSecrets, ProgressReporter, StackStateStore,
};
use crate::domain::bootstrap::BootScript;
use crate::domain::stack::{SERVICE_ROUTES, STACK_NAME, validate_route_prefixes};
use crate::domain::{StackError, StackState};

/// Provider parameters for a fresh stack.
pub struct UpParams<'a> {
    /// Machine image identifier.
    pub image_id: &'a str,
    /// Instance class.
    pub instance_type: &'a str,
    /// Subnet the instance is placed in.
    pub subnet_id: &'a str,
    /// Security group attached to the instance.
    pub security_group_id: &'a str,
    /// Security group guarding the database.
    pub db_security_group_id: &'a str,
    /// Allocation id of the pre-existing reserved address.
    pub allocation_id: &'a str,
    /// Repository the boot script clones onto the instance.
    pub repo_url: &'a str,
    /// Database port opened to the instance's private address.
    pub db_port: u16,
}

/// Derive the remote application directory from the repository URL.
///
/// `https://example.com/campus/platform.git` → `/home/ubuntu/platform`.
#[must_use]
pub fn app_dir_for(repo_url: &str) -> String {
    let stem = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("app")
        .trim_end_matches(".git");
    let stem = if stem.is_empty() { "app" } else { stem };
    format!("/home/{}/{stem}", crate::domain::stack::SSH_USER)
}

/// Provision the whole stack and persist its state.
///
/// # Errors
///
/// Returns an error if a stack already exists or any provisioning step
/// fails. No partial-state cleanup is attempted here; `campus down` removes
/// whatever was recorded.
pub async fn provision_stack(
    cloud: &impl CloudApi,
    secrets: &impl LocalSecrets,
    state_mgr: &impl StackStateStore,
    reporter: &impl ProgressReporter,
    params: &UpParams<'_>,
) -> Result<StackState> {
    if let Some(existing) = state_mgr.load_async().await? {
        return Err(StackError::AlreadyExists(existing.instance_id).into());
    }
    validate_route_prefixes(&SERVICE_ROUTES)?;

    // Keypair: register with the provider, keep the private half local.
    reporter.step("registering keypair...");
    let material = cloud
        .create_key_pair(STACK_NAME)
        .await
        .context("creating keypair")?;
    let key_path = secrets
        .persist_private_key(&material)
        .await
        .context("persisting private key")?;
    reporter.success(&format!("private key written to {}", key_path.display()));

    // The reserved address is resolved up front: the gateway integrations
    // must target it, never the instance's ephemeral address.
    let public_ip = cloud
        .resolve_address(params.allocation_id)
        .await
        .context("resolving reserved address")?;

    // Instance with the one-shot boot script.
    reporter.step("launching instance...");
    let app_dir = app_dir_for(params.repo_url);
    let user_data = BootScript {
        repo_url: params.repo_url,
        app_dir: &app_dir,
    }
    .render();
    let spec = InstanceSpec {
        image_id: params.image_id,
        instance_type: params.instance_type,
        subnet_id: params.subnet_id,
        security_group_id: params.security_group_id,
        key_name: STACK_NAME,
        user_data: &user_data,
        name_tag: STACK_NAME,
    };
    let instance_id = cloud
        .run_instance(&spec)
        .await
        .context("launching instance")?;
    cloud
        .wait_running(&instance_id)
        .await
        .context("waiting for instance to run")?;
    let facts = cloud
        .describe_instance(&instance_id)
        .await
        .context("describing instance")?;
    reporter.success(&format!("instance {instance_id} running"));

    // Address binding before anything routes traffic.
    reporter.step("binding reserved address...");
    let association_id = cloud
        .associate_address(params.allocation_id, &instance_id)
        .await
        .context("binding reserved address")?;
    reporter.success(&format!("address {public_ip} bound"));

    // Gateway fan-out: one integration and one route per declared service.
    reporter.step("creating gateway fan-out...");
    let api = cloud
        .create_http_api(STACK_NAME)
        .await
        .context("creating HTTP API")?;
    for route in &SERVICE_ROUTES {
        let integration_id = cloud
            .create_integration(&api.api_id, &route.integration_uri(&public_ip))
            .await
            .with_context(|| format!("creating integration for {}", route.name))?;
        cloud
            .create_route(&api.api_id, &route.route_key(), &integration_id)
            .await
            .with_context(|| format!("creating route for {}", route.name))?;
    }
    cloud
        .create_default_stage(&api.api_id)
        .await
        .context("creating default stage")?;
    reporter.success(&format!("gateway live at {}", api.endpoint));

    // DB access rule from the instance's private address.
    reporter.step("authorizing database access...");
    let source_cidr = format!("{}/32", facts.private_ip);
    cloud
        .authorize_ingress(params.db_security_group_id, params.db_port, &source_cidr)
        .await
        .context("authorizing database ingress")?;
    reporter.success(&format!(
        "port {} open to {source_cidr}",
        params.db_port
    ));

    let state = StackState {
        created_at: Utc::now(),
        key_name: STACK_NAME.to_owned(),
        instance_id,
        public_ip,
        private_ip: facts.private_ip,
        association_id,
        api_id: api.api_id,
        invoke_url: api.endpoint,
        db_security_group_id: params.db_security_group_id.to_owned(),
        db_port: params.db_port,
        repo_url: params.repo_url.to_owned(),
        env_path: format!("{app_dir}/.env"),
        app_dir,
    };
    state_mgr.save_async(&state).await?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_dir_strips_git_suffix() {
        assert_eq!(
            app_dir_for("https://example.com/campus/platform.git"),
            "/home/ubuntu/platform"
        );
    }

    #[test]
    fn test_app_dir_handles_trailing_slash() {
        assert_eq!(
            app_dir_for("https://example.com/campus/platform/"),
            "/home/ubuntu/platform"
        );
    }

    #[test]
    fn test_app_dir_falls_back_for_degenerate_url() {
        assert_eq!(app_dir_for(""), "/home/ubuntu/app");
    }
}
