//! Boot script generation.
//!
//! The instance runs this script exactly once at first boot. It installs the
//! application's runtimes and container engine, clones the repository, and
//! writes the completion marker the readiness poller waits for. `set -e`
//! means any failed step exits before the marker is written, so the poller
//! times out instead of handing off onto a half-initialized host.

use crate::domain::stack::{MARKER_PATH, SSH_USER};

/// Parameters for the one-shot boot script.
pub struct BootScript<'a> {
    /// Repository cloned onto the instance.
    pub repo_url: &'a str,
    /// Directory the repository is cloned into.
    pub app_dir: &'a str,
}

impl BootScript<'_> {
    /// Render the script passed to the instance as user data.
    #[must_use]
    pub fn render(&self) -> String {
        let BootScript { repo_url, app_dir } = self;
        format!(
            "#!/bin/bash\n\
             set -euo pipefail\n\
             export DEBIAN_FRONTEND=noninteractive\n\
             apt-get update -y\n\
             apt-get install -y git nodejs npm openjdk-17-jre-headless \\\n\
                 docker.io docker-compose-v2\n\
             systemctl enable --now docker\n\
             usermod -aG docker {SSH_USER}\n\
             git clone {repo_url} {app_dir}\n\
             chown -R {SSH_USER}:{SSH_USER} {app_dir}\n\
             touch {MARKER_PATH}\n\
             chown {SSH_USER}:{SSH_USER} {MARKER_PATH}\n"
        )
    }
}
