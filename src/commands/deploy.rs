//! `campus deploy` — re-run the readiness wait and configuration handoff
//! against the existing stack.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::StackStateStore;
use crate::application::services::{handoff, readiness};
use crate::commands::up::{health_schedule, print_outputs};
use crate::domain::StackError;
use crate::domain::retry::BackoffSchedule;
use crate::domain::stack::{MARKER_PATH, SSH_USER};

/// Arguments for the deploy command.
#[derive(Args, Default)]
pub struct DeployArgs {
    /// Boot completion marker file on the instance
    #[arg(long, default_value = MARKER_PATH)]
    pub marker_path: String,
}

/// Run `campus deploy`.
///
/// The whole sequence is idempotent: the marker probe is read-only and the
/// env rendering converges, so re-running against a live stack is safe.
///
/// # Errors
///
/// Returns an error if no stack exists or any handoff step fails.
pub async fn run(args: &DeployArgs, app: &AppContext) -> Result<()> {
    let state = app
        .state_mgr
        .load_async()
        .await?
        .ok_or(StackError::NotFound)?;
    let reporter = app.reporter();
    let shell = app.remote_shell(SSH_USER, &state.public_ip);

    let schedule = BackoffSchedule::default();
    readiness::wait_for_boot(&shell, &args.marker_path, &schedule, &reporter).await?;
    handoff::push_config(&shell, &state, &reporter).await?;
    handoff::launch_stack(&shell, &state, &reporter).await?;
    handoff::wait_healthy(&shell, &state, &health_schedule(), &reporter).await?;

    print_outputs(app, &state.public_ip, &state.invoke_url);
    Ok(())
}
