//! Infrastructure layer — adapters implementing the application ports.

pub mod aws;
pub mod command_runner;
pub mod ssh;
pub mod state;
