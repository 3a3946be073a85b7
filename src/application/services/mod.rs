//! Application services — one module per use-case.

pub mod handoff;
pub mod provision;
pub mod readiness;
pub mod teardown;
