//! `campus down` — tear the stack down.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::StackStateStore;
use crate::application::services::teardown;
use crate::domain::StackError;

/// Run `campus down`.
///
/// # Errors
///
/// Returns an error if no stack exists or any destroy step fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let state = app
        .state_mgr
        .load_async()
        .await?
        .ok_or(StackError::NotFound)?;

    let confirmed = app.non_interactive
        || app.confirm(
            &format!(
                "Destroy instance {}, its address binding, gateway, and keypair?",
                state.instance_id
            ),
            false,
        )?;
    if !confirmed {
        app.output.info("Aborted.");
        return Ok(());
    }

    let reporter = app.reporter();
    teardown::teardown_stack(&app.cloud, &app.secrets, &app.state_mgr, &reporter, &state).await?;
    app.output.success("Stack destroyed.");
    Ok(())
}
