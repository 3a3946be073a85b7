//! Command handlers — one module per subcommand.

pub mod deploy;
pub mod down;
pub mod status;
pub mod up;
pub mod version;

pub use deploy::DeployArgs;
pub use up::UpArgs;
