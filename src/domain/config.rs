//! Pure env-file rendering for the configuration handoff.
//!
//! The whole file is rendered locally and uploaded once, so a partial
//! update can never be observed remotely.

use crate::domain::stack::ServiceRoute;

/// Rewrite `content` by applying each `(key, value)` pair in order.
///
/// A line is rewritten iff it starts with `<key>=`; the whole line becomes
/// `<key>=<value>`. A key with no matching line is a no-op, not an error.
/// Every non-matching line is preserved byte for byte, including blank
/// lines and comments. Applying the same pairs twice converges: the output
/// is a fixed point.
#[must_use]
pub fn render_env(content: &str, pairs: &[(String, String)]) -> String {
    let ends_with_newline = content.ends_with('\n');
    let mut lines: Vec<String> = content.lines().map(str::to_owned).collect();
    for (key, value) in pairs {
        let prefix = format!("{key}=");
        for line in &mut lines {
            if line.starts_with(&prefix) {
                *line = format!("{prefix}{value}");
            }
        }
    }
    let mut out = lines.join("\n");
    if ends_with_newline {
        out.push('\n');
    }
    out
}

/// Build the handoff replacement list: the public address plus one endpoint
/// URL per declared service, all pointing at the same gateway invoke URL.
#[must_use]
pub fn handoff_pairs(
    routes: &[ServiceRoute],
    public_ip: &str,
    invoke_url: &str,
) -> Vec<(String, String)> {
    let mut pairs = vec![("PUBLIC_IP".to_owned(), public_ip.to_owned())];
    for route in routes {
        pairs.push((route.endpoint_key(), invoke_url.to_owned()));
    }
    pairs
}
