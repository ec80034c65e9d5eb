//! The remote-services marker that lets the speaker honor its private configuration.

use crate::errors::MigrationError;
use crate::paths::{PERSISTENT_REMOTE_SERVICES, REMOTE_SERVICES_MARKERS};
use crate::shell::ShellCommand;

use super::remote::Remote;
use super::MigrationManager;

/// Privileged form first, then the plain one.
fn attempts(command: ShellCommand) -> [ShellCommand; 2] {
    [command.clone().privileged(), command]
}

impl MigrationManager {
    /// Create the marker at the first candidate location that accepts it.
    pub(crate) fn enable_remote_services(&self, remote: &Remote) -> Result<String, MigrationError> {
        for path in REMOTE_SERVICES_MARKERS {
            for cmd in attempts(ShellCommand::new("touch").arg(path)) {
                match remote.try_run(&cmd) {
                    Ok(_) => return Ok(path.to_string()),
                    Err(e) if e.is_connect() => {
                        return Err(MigrationError::Unreachable {
                            host: remote.host().to_string(),
                            reason: e.to_string(),
                        })
                    }
                    Err(_) => continue,
                }
            }
        }
        Err(MigrationError::RemoteServicesUnavailable)
    }

    /// Delete the marker wherever it can be deleted; fails only if no location accepts removal.
    pub(crate) fn disable_remote_services(
        &self,
        remote: &Remote,
    ) -> Result<Vec<String>, MigrationError> {
        let mut removed = Vec::new();
        for path in REMOTE_SERVICES_MARKERS {
            for cmd in attempts(ShellCommand::new("rm").args(["-f", path])) {
                if remote.try_run(&cmd).is_ok() {
                    removed.push(path.to_string());
                    break;
                }
            }
        }
        if removed.is_empty() {
            return Err(MigrationError::RemoteServicesUnavailable);
        }
        Ok(removed)
    }

    /// (enabled anywhere, enabled on persistent storage)
    pub(crate) fn remote_services_state(&self, remote: &Remote) -> (bool, bool) {
        let present = |path: &str| remote.exists(path).unwrap_or(false);
        let persistent = present(PERSISTENT_REMOTE_SERVICES);
        let enabled = persistent
            || REMOTE_SERVICES_MARKERS
                .iter()
                .skip(1)
                .any(|path| present(*path));
        (enabled, persistent)
    }

    /// Returns the marker location that was created.
    pub fn ensure_remote_services(&self, device: &str) -> Result<String, MigrationError> {
        self.enable_remote_services(&self.remote(device))
    }

    /// Returns every location the marker was cleared from.
    pub fn remove_remote_services(&self, device: &str) -> Result<Vec<String>, MigrationError> {
        self.disable_remote_services(&self.remote(device))
    }
}
