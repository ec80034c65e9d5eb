use crate::errors::MigrationError;
use crate::hosts::rewrite_hosts;
use crate::paths::HOSTS_FILE;

use super::remote::Remote;
use super::utils::{redirect_host, OpLog};
use super::{MigrationManager, MigrationPlan};

impl MigrationManager {
    /// Point vendor domains at the target in /etc/hosts and trust the local CA.
    pub(crate) fn migrate_hosts(
        &self,
        remote: &Remote,
        plan: &MigrationPlan,
        log: &mut OpLog,
    ) -> Result<(), MigrationError> {
        let host = redirect_host(plan.target)?;
        let ip = self.resolve_ip(remote, &host, log);

        let current = match remote.read(HOSTS_FILE) {
            Ok(text) => Some(text),
            Err(e @ MigrationError::Unreachable { .. }) => return Err(e),
            Err(e) => {
                log.warn(format!("Could not read {HOSTS_FILE}: {e}"));
                None
            }
        };
        let rewritten = rewrite_hosts(
            current.as_deref().unwrap_or("127.0.0.1\tlocalhost\n"),
            &ip,
        );

        if current.is_some() {
            remote.backup_once(HOSTS_FILE, log)?;
        }
        remote.upload(rewritten.as_bytes(), HOSTS_FILE)?;
        log.step(format!("Vendor domains in {HOSTS_FILE} now resolve to {ip}"));

        self.ensure_ca_trusted(remote, log)
    }
}
