//! Stack domain types: the fixed service route table and the persisted
//! stack record.
//!
//! This module is intentionally free of I/O, async, and external layer
//! imports. All functions take data in and return data out.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::StackError;

/// One backend service behind the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRoute {
    /// URL path prefix and service name (e.g. `admin` → `/admin/...`).
    pub name: &'static str,
    /// Backend port on the instance.
    pub port: u16,
}

/// The fixed route table, declared at author time.
///
/// The gateway fans out by path prefix to these four services; the set is
/// not runtime-discovered.
pub const SERVICE_ROUTES: [ServiceRoute; 4] = [
    ServiceRoute { name: "admin", port: 8085 },
    ServiceRoute { name: "courses", port: 8086 },
    ServiceRoute { name: "feedbacks", port: 8088 },
    ServiceRoute { name: "learning", port: 8087 },
];

impl ServiceRoute {
    /// Gateway route key, e.g. `ANY /admin/{proxy+}`.
    #[must_use]
    pub fn route_key(&self) -> String {
        format!("ANY /{}/{{proxy+}}", self.name)
    }

    /// Backend integration URI against the statically bound address.
    ///
    /// Always built from the reserved public address, never the instance's
    /// ephemeral address — routing correctness depends on address binding
    /// completing before traffic flows.
    #[must_use]
    pub fn integration_uri(&self, public_ip: &str) -> String {
        format!("http://{public_ip}:{}/{{proxy}}", self.port)
    }

    /// Environment key the handoff rewrites for this service,
    /// e.g. `ADMIN_SERVICE_URL`.
    #[must_use]
    pub fn endpoint_key(&self) -> String {
        format!("{}_SERVICE_URL", self.name.to_uppercase())
    }
}

/// Check that every declared path prefix is unique.
///
/// # Errors
///
/// Returns [`StackError::DuplicateRoutePrefix`] naming the first repeated
/// prefix.
pub fn validate_route_prefixes(routes: &[ServiceRoute]) -> Result<()> {
    for (i, route) in routes.iter().enumerate() {
        if routes[..i].iter().any(|r| r.name == route.name) {
            return Err(StackError::DuplicateRoutePrefix(route.name.to_string()).into());
        }
    }
    Ok(())
}

/// Remote user the boot script and handoff operate as.
pub const SSH_USER: &str = "ubuntu";

/// Marker file written by the boot script on successful completion.
pub const MARKER_PATH: &str = "/home/ubuntu/.bootstrap-complete";

/// Provider-side name for the generated keypair and the instance Name tag.
pub const STACK_NAME: &str = "campus";

/// Stack state persisted to `~/.campus/state.json`.
///
/// Everything `deploy`, `status`, and `down` need survives here so only
/// `up` takes the full set of provider parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// When the stack was provisioned.
    pub created_at: DateTime<Utc>,
    /// Provider-side keypair name.
    pub key_name: String,
    /// Compute instance identifier.
    pub instance_id: String,
    /// Reserved public address bound to the instance.
    pub public_ip: String,
    /// Instance private address (source of the DB access rule).
    pub private_ip: String,
    /// Elastic IP association identifier.
    pub association_id: String,
    /// HTTP API identifier.
    pub api_id: String,
    /// Gateway stage invoke URL.
    pub invoke_url: String,
    /// Database security group the ingress rule was added to.
    pub db_security_group_id: String,
    /// Database port opened to the instance.
    pub db_port: u16,
    /// Repository the boot script cloned onto the instance.
    pub repo_url: String,
    /// Remote path of the application env file.
    pub env_path: String,
    /// Remote working directory holding the cloned repository.
    pub app_dir: String,
}
