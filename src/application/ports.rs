//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::Output;

use anyhow::Result;

use crate::domain::StackState;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Request parameters for launching the compute instance.
///
/// These are the fixed request fields reproduced on every launch: image,
/// class, placement, security group, key, tags, and the one-shot boot
/// script passed as user data.
pub struct InstanceSpec<'a> {
    /// Machine image identifier, e.g. `"ami-0abcdef1234567890"`.
    pub image_id: &'a str,
    /// Instance class, e.g. `"t2.medium"`.
    pub instance_type: &'a str,
    /// Network subnet the instance is placed in.
    pub subnet_id: &'a str,
    /// Security group attached to the instance.
    pub security_group_id: &'a str,
    /// Name of the registered keypair the instance trusts.
    pub key_name: &'a str,
    /// Rendered boot script, run exactly once at first boot.
    pub user_data: &'a str,
    /// Value of the `Name` tag.
    pub name_tag: &'a str,
}

/// Provider-assigned facts about a running instance.
#[derive(Debug, Clone)]
pub struct InstanceFacts {
    /// Lifecycle state name, e.g. `"running"`.
    pub state: String,
    /// Private address inside the subnet.
    pub private_ip: String,
}

/// Handle to a created HTTP API.
#[derive(Debug, Clone)]
pub struct ApiHandle {
    /// Provider-assigned API identifier.
    pub api_id: String,
    /// Base endpoint; with an auto-deploying `$default` stage this is the
    /// invoke URL consumers call.
    pub endpoint: String,
}

// ── Cloud Port Traits ─────────────────────────────────────────────────────────

/// Keypair registration with the cloud provider.
#[allow(async_fn_in_trait)]
pub trait KeyPairs {
    /// Create an ed25519 keypair and return the private key material.
    async fn create_key_pair(&self, name: &str) -> Result<String>;
    /// Delete a registered keypair.
    async fn delete_key_pair(&self, name: &str) -> Result<()>;
}

/// Compute instance lifecycle and inspection.
#[allow(async_fn_in_trait)]
pub trait Instances {
    /// Launch an instance and return its identifier.
    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String>;
    /// Query state and private address of an instance.
    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceFacts>;
    /// Block until the instance reaches the `running` state.
    async fn wait_running(&self, instance_id: &str) -> Result<()>;
    /// Terminate the instance.
    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;
    /// Block until the instance reaches the `terminated` state.
    async fn wait_terminated(&self, instance_id: &str) -> Result<()>;
}

/// Static public address management.
#[allow(async_fn_in_trait)]
pub trait Addresses {
    /// Resolve the reserved public address behind an allocation.
    async fn resolve_address(&self, allocation_id: &str) -> Result<String>;
    /// Bind the reserved address to an instance; returns the association id.
    async fn associate_address(&self, allocation_id: &str, instance_id: &str) -> Result<String>;
    /// Release the binding (the allocation itself stays reserved).
    async fn disassociate_address(&self, association_id: &str) -> Result<()>;
}

/// HTTP gateway objects: api, integration, route, stage.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Create an HTTP API and return its handle.
    async fn create_http_api(&self, name: &str) -> Result<ApiHandle>;
    /// Create an `HTTP_PROXY` integration to `uri`; returns the integration id.
    async fn create_integration(&self, api_id: &str, uri: &str) -> Result<String>;
    /// Create a route with `route_key` targeting an integration.
    async fn create_route(&self, api_id: &str, route_key: &str, integration_id: &str)
    -> Result<()>;
    /// Create the auto-deploying `$default` stage.
    async fn create_default_stage(&self, api_id: &str) -> Result<()>;
    /// Delete the HTTP API and everything under it.
    async fn delete_http_api(&self, api_id: &str) -> Result<()>;
}

/// Security group ingress rules.
#[allow(async_fn_in_trait)]
pub trait SecurityGroups {
    /// Authorize TCP ingress on `port` from `source_cidr`.
    async fn authorize_ingress(&self, group_id: &str, port: u16, source_cidr: &str) -> Result<()>;
    /// Revoke a previously authorized ingress rule.
    async fn revoke_ingress(&self, group_id: &str, port: u16, source_cidr: &str) -> Result<()>;
}

/// Composite trait — any type implementing the five cloud sub-traits is a
/// `CloudApi`.
pub trait CloudApi: KeyPairs + Instances + Addresses + Gateway + SecurityGroups {}

/// Blanket implementation for the composite.
impl<T> CloudApi for T where T: KeyPairs + Instances + Addresses + Gateway + SecurityGroups {}

// ── Remote Shell Port ─────────────────────────────────────────────────────────

/// Remote command execution and file transfer against the instance,
/// authenticated by the generated private key.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Whether the host key has been captured and pinned yet.
    fn is_pinned(&self) -> bool;
    /// Capture the host's ed25519 key, pin it for every later session, and
    /// return its SHA-256 fingerprint. Must succeed before any `exec` or
    /// `upload` call.
    async fn pin_host_key(&self) -> Result<String>;
    /// Run a command on the instance and capture its output.
    async fn exec(&self, args: &[&str]) -> Result<Output>;
    /// Copy a local file onto the instance.
    async fn upload(&self, local: &std::path::Path, remote: &str) -> Result<Output>;
}

// ── Local Secrets Port ────────────────────────────────────────────────────────

/// Abstracts local persistence of SSH credential material (private key and
/// pinned host key), so services never touch the filesystem directly.
#[allow(async_fn_in_trait)]
pub trait LocalSecrets {
    /// Write the private key material with owner-only read permission and
    /// return its path.
    async fn persist_private_key(&self, material: &str) -> Result<std::path::PathBuf>;
    /// Remove the private key file and the pinned host key, if present.
    async fn clear(&self) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State Port ────────────────────────────────────────────────────────────────

/// Abstracts stack state persistence (load/save/clear).
#[allow(async_fn_in_trait)]
pub trait StackStateStore {
    /// Load the current stack state, returning `None` if no state exists.
    async fn load_async(&self) -> Result<Option<StackState>>;
    /// Persist the given stack state.
    async fn save_async(&self, state: &StackState) -> Result<()>;
    /// Remove any persisted state.
    async fn clear_async(&self) -> Result<()>;
}
