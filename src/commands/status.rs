//! `campus status` — show stack state and the provisioning outputs.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::ports::{Instances, StackStateStore};
use crate::domain::StackState;

/// Machine-readable status payload for `--json`.
#[derive(Serialize)]
struct StatusReport<'a> {
    provisioned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance_state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invoke_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

/// Run `campus status`.
///
/// # Errors
///
/// Returns an error if the state file is unreadable or the instance query
/// fails.
pub async fn run(app: &AppContext, json: bool) -> Result<()> {
    let Some(state) = app.state_mgr.load_async().await? else {
        if json {
            let report = StatusReport {
                provisioned: false,
                instance_id: None,
                instance_state: None,
                public_ip: None,
                invoke_url: None,
                created_at: None,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            app.output.info("No stack provisioned. Run: campus up");
        }
        return Ok(());
    };

    // Live state, best effort — a cloud hiccup should not hide the outputs.
    let instance_state = match app.cloud.describe_instance(&state.instance_id).await {
        Ok(facts) => facts.state,
        Err(_) => "unknown".to_owned(),
    };

    if json {
        let report = StatusReport {
            provisioned: true,
            instance_id: Some(&state.instance_id),
            instance_state: Some(&instance_state),
            public_ip: Some(&state.public_ip),
            invoke_url: Some(&state.invoke_url),
            created_at: Some(state.created_at.to_rfc3339()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human(app, &state, &instance_state);
    Ok(())
}

fn print_human(app: &AppContext, state: &StackState, instance_state: &str) {
    let ctx = &app.output;
    ctx.header("Stack");
    ctx.kv("Instance", &format!("{} ({instance_state})", state.instance_id));
    ctx.kv("Public address", &state.public_ip);
    ctx.kv("Gateway URL", &state.invoke_url);
    ctx.kv("Repository", &state.repo_url);
    ctx.kv("DB access", &format!("port {} from {}/32", state.db_port, state.private_ip));
    ctx.kv("Created", &state.created_at.to_rfc3339());
}
