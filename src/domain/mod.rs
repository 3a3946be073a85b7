//! Domain layer — pure types, constants, and validation.
//!
//! Nothing in this layer performs I/O or imports from `infra`, `commands`,
//! or `output`.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod retry;
pub mod stack;

pub use error::{HandoffError, ReadinessError, StackError};
pub use stack::StackState;
