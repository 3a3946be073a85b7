//! Typed domain error enums.
//!
//! Error messages are user-facing: each one says what failed and what to
//! run next.

use thiserror::Error;

// ── Stack errors ──────────────────────────────────────────────────────────────

/// Errors related to stack provisioning and identity.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("No stack found. Run 'campus up' to provision one.")]
    NotFound,

    #[error("A stack already exists (instance {0}). Run 'campus down' first.")]
    AlreadyExists(String),

    #[error("Cloud request '{operation}' failed:\n{stderr}")]
    ProviderRequest { operation: String, stderr: String },

    #[error("Cloud response for '{operation}' is missing field '{field}'")]
    MalformedResponse {
        operation: String,
        field: &'static str,
    },

    #[error("Route path prefix '/{0}' is declared more than once")]
    DuplicateRoutePrefix(String),
}

// ── Readiness errors ──────────────────────────────────────────────────────────

/// Errors from the remote readiness poller.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The bounded poll loop exhausted every attempt without seeing the
    /// marker file.
    #[error(
        "Instance did not signal boot completion after {attempts} checks \
         (~{waited_secs}s). The boot script may have failed before writing \
         {marker}.\nInspect: campus status"
    )]
    TimedOut {
        attempts: u32,
        waited_secs: u64,
        marker: String,
    },
}

// ── Handoff errors ────────────────────────────────────────────────────────────

/// Errors from the configuration handoff and stack launch.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("Remote configuration file {path} could not be read:\n{stderr}")]
    FetchFailed { path: String, stderr: String },

    #[error("Uploading rendered configuration to {path} failed:\n{stderr}")]
    UploadFailed { path: String, stderr: String },

    #[error("Application stack failed to start:\n{stderr}")]
    LaunchFailed { stderr: String },

    #[error("Application stack is not healthy: {reason}")]
    Unhealthy { reason: String },
}
