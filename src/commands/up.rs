//! `campus up` — provision the whole stack, then hand off and launch.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{handoff, provision, readiness};
use crate::domain::retry::BackoffSchedule;
use crate::domain::stack::{MARKER_PATH, SSH_USER};

/// Arguments for the up command.
#[derive(Args)]
pub struct UpArgs {
    /// Machine image the instance boots from
    #[arg(long = "ami", env = "CAMPUS_AMI")]
    pub image_id: String,

    /// Instance class
    #[arg(long, env = "CAMPUS_INSTANCE_TYPE", default_value = "t2.medium")]
    pub instance_type: String,

    /// Subnet the instance is placed in
    #[arg(long, env = "CAMPUS_SUBNET_ID")]
    pub subnet_id: String,

    /// Security group attached to the instance
    #[arg(long, env = "CAMPUS_SECURITY_GROUP_ID")]
    pub security_group_id: String,

    /// Security group guarding the database
    #[arg(long, env = "CAMPUS_DB_SECURITY_GROUP_ID")]
    pub db_security_group_id: String,

    /// Allocation id of the pre-existing reserved address
    #[arg(long, env = "CAMPUS_ALLOCATION_ID")]
    pub allocation_id: String,

    /// Repository the boot script clones onto the instance
    #[arg(long, env = "CAMPUS_REPO_URL")]
    pub repo_url: String,

    /// Database port opened to the instance
    #[arg(long, env = "CAMPUS_DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    /// Boot completion marker file on the instance
    #[arg(long, default_value = MARKER_PATH)]
    pub marker_path: String,

    /// Provision only; skip the readiness wait and application handoff
    #[arg(long)]
    pub no_deploy: bool,
}

/// Run `campus up`.
///
/// # Errors
///
/// Returns an error if any provisioning or handoff step fails.
pub async fn run(args: &UpArgs, app: &AppContext) -> Result<()> {
    let reporter = app.reporter();
    let params = provision::UpParams {
        image_id: &args.image_id,
        instance_type: &args.instance_type,
        subnet_id: &args.subnet_id,
        security_group_id: &args.security_group_id,
        db_security_group_id: &args.db_security_group_id,
        allocation_id: &args.allocation_id,
        repo_url: &args.repo_url,
        db_port: args.db_port,
    };
    let state =
        provision::provision_stack(&app.cloud, &app.secrets, &app.state_mgr, &reporter, &params)
            .await?;

    if args.no_deploy {
        app.output
            .info("Provisioned without deploying. Finish later with: campus deploy");
    } else {
        let shell = app.remote_shell(SSH_USER, &state.public_ip);
        let schedule = BackoffSchedule::default();
        readiness::wait_for_boot(&shell, &args.marker_path, &schedule, &reporter).await?;
        handoff::push_config(&shell, &state, &reporter).await?;
        handoff::launch_stack(&shell, &state, &reporter).await?;
        handoff::wait_healthy(&shell, &state, &health_schedule(), &reporter).await?;
    }

    print_outputs(app, &state.public_ip, &state.invoke_url);
    Ok(())
}

/// Container health re-check schedule: fixed short interval, no growth.
pub(crate) fn health_schedule() -> BackoffSchedule {
    BackoffSchedule {
        grace: std::time::Duration::ZERO,
        base_delay: std::time::Duration::from_secs(2),
        max_delay: std::time::Duration::from_secs(2),
        max_attempts: 30,
    }
}

/// Print the two stack outputs consumers care about.
pub(crate) fn print_outputs(app: &AppContext, public_ip: &str, invoke_url: &str) {
    let ctx = &app.output;
    if ctx.quiet {
        return;
    }
    ctx.success("Stack ready.");
    ctx.kv("Public address", public_ip);
    ctx.kv("Gateway URL", invoke_url);
    ctx.kv("Status", "campus status");
}
