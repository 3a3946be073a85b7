//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Provision the campus learning stack on AWS
#[derive(Parser)]
#[command(
    name = "campus",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip interactive prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Cloud region override
    #[arg(long, global = true, env = "CAMPUS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the stack and launch the application
    Up(commands::UpArgs),

    /// Re-run readiness wait, config handoff, and launch
    Deploy(commands::DeployArgs),

    /// Show stack state and outputs
    Status,

    /// Destroy the stack
    Down,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            region,
            command,
        } = self;

        let flags = AppFlags {
            no_color,
            quiet,
            yes,
            region,
        };

        match command {
            Command::Version => commands::version::run(json),
            Command::Up(args) => {
                let app = AppContext::new(&flags)?;
                commands::up::run(&args, &app).await
            }
            Command::Deploy(args) => {
                let app = AppContext::new(&flags)?;
                commands::deploy::run(&args, &app).await
            }
            Command::Status => {
                let app = AppContext::new(&flags)?;
                commands::status::run(&app, json).await
            }
            Command::Down => {
                let app = AppContext::new(&flags)?;
                commands::down::run(&app).await
            }
        }
    }
}
