//! `campus version` — show version.

use anyhow::Result;

/// Run `campus version`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        println!("{}", serde_json::json!({ "version": version }));
    } else {
        println!("campus {version}");
    }
    Ok(())
}
