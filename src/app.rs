//! Application context — unified state passed to every command handler.
//!
//! `AppContext` is constructed once in `Cli::run()` and passed as
//! `&AppContext` to all command handlers. Adding a new cross-cutting
//! concern requires only one field change here.

use anyhow::Result;

use crate::infra::aws::AwsCli;
use crate::infra::command_runner::{
    DEFAULT_CLOUD_TIMEOUT, DEFAULT_REMOTE_TIMEOUT, TokioCommandRunner,
};
use crate::infra::ssh::{CampusHome, LocalKeyStore, OpenSsh};
use crate::infra::state::StateManager;
use crate::output::{OutputContext, TerminalReporter};

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Skip interactive prompts (also set by `CI` / `CAMPUS_YES` env vars).
    pub yes: bool,
    /// Cloud region override.
    pub region: Option<String>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Cloud API adapter over the `aws` CLI.
    pub cloud: AwsCli<TokioCommandRunner>,
    /// Local secret material (private key, pinned host key).
    pub secrets: LocalKeyStore,
    /// Stack state manager.
    pub state_mgr: StateManager,
    /// Local directory layout (`~/.campus`).
    pub home: CampusHome,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("CAMPUS_YES").is_ok();
        let non_interactive = flags.yes || ci_env;

        let home = CampusHome::new()?;
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            cloud: AwsCli::new(
                TokioCommandRunner::new(DEFAULT_CLOUD_TIMEOUT),
                flags.region.clone(),
            ),
            secrets: LocalKeyStore::new(home.clone()),
            state_mgr: StateManager::with_path(home.state_path()),
            home,
            non_interactive,
        })
    }

    /// Build a remote shell against `host`, authenticated by the generated
    /// key and verified against the pinned host key.
    #[must_use]
    pub fn remote_shell(&self, user: &str, host: &str) -> OpenSsh<TokioCommandRunner> {
        OpenSsh::new(
            TokioCommandRunner::new(DEFAULT_REMOTE_TIMEOUT),
            self.home.clone(),
            user,
            host,
        )
    }

    /// Progress reporter bound to this context's output settings.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `CAMPUS_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
