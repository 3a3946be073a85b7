//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::sync::Mutex;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;
use crate::output::progress;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY, `step()` drives a live spinner that `success()` resolves to a
/// checkmark. Off-TTY (or with `--quiet`), steps print as plain lines so
/// logs stay readable.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: Mutex<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: Mutex::new(None),
        }
    }

    fn take_active(&self) -> Option<ProgressBar> {
        self.active.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if self.ctx.is_tty {
            let Ok(mut slot) = self.active.lock() else {
                return;
            };
            if let Some(pb) = slot.as_ref() {
                pb.set_message(message.to_string());
            } else {
                *slot = Some(progress::spinner(message));
            }
        } else {
            println!("  {} {message}", "→".cyan());
        }
    }

    fn success(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if let Some(pb) = self.take_active() {
            progress::finish_ok(&pb, message);
        } else {
            println!("  {} {message}", "✓".green());
        }
    }

    fn warn(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if let Some(pb) = self.take_active() {
            pb.finish_and_clear();
        }
        println!("  {} {message}", "!".yellow());
    }
}
