use crate::errors::MigrationError;
use crate::patch::{patch_boot_script, patch_dhcp_script, strip_dhcp_hook, HOOK_BEGIN};
use crate::paths::{original_of, BOOT_SCRIPT, DHCP_SCRIPTS, PRIORITY_NAMESERVER, RESOLV_CONF};
use crate::shell::ShellCommand;

use super::remote::Remote;
use super::utils::{redirect_host, OpLog};
use super::{MigrationManager, MigrationPlan};

const DNS_PORT: u16 = 53;

impl MigrationManager {
    /// Refuse the resolv method unless the local DNS service can answer on port 53.
    pub(crate) fn check_dns_ready(&self) -> Result<(), MigrationError> {
        let settings = self
            .store
            .dns_settings()
            .map_err(|e| MigrationError::Store(format!("{e:#}")))?;
        if !settings.enabled {
            return Err(MigrationError::DnsDisabled);
        }
        if settings.port() != Some(DNS_PORT) {
            return Err(MigrationError::DnsWrongPort {
                bind: settings.bind,
            });
        }
        if let Some(status) = &self.dns_status {
            let status = status();
            if !status.running {
                return Err(MigrationError::DnsNotRunning("service stopped".to_string()));
            }
            if status.port != DNS_PORT {
                return Err(MigrationError::DnsNotRunning(format!(
                    "listening on port {}",
                    status.port
                )));
            }
        }
        Ok(())
    }

    /// Install a priority nameserver and a DHCP hook that keeps it first in resolv.conf.
    pub(crate) fn migrate_resolv(
        &self,
        remote: &Remote,
        plan: &MigrationPlan,
        log: &mut OpLog,
    ) -> Result<(), MigrationError> {
        self.check_dns_ready()?;
        log.step("Local DNS redirection is enabled on port 53");

        let host = redirect_host(plan.target)?;
        let ip = self.resolve_ip(remote, &host, log);

        let nameserver = format!("nameserver {ip}\n");
        let previous = match remote.read(PRIORITY_NAMESERVER) {
            Ok(text) => text,
            Err(e @ MigrationError::Unreachable { .. }) => return Err(e),
            Err(_) => String::new(),
        };
        remote.upload(nameserver.as_bytes(), PRIORITY_NAMESERVER)?;
        log.step(format!("Wrote {PRIORITY_NAMESERVER} ({})", nameserver.trim()));

        install_boot_hook(remote, log)?;
        for script in DHCP_SCRIPTS {
            patch_live_dhcp_script(remote, script, log)?;
        }
        apply_to_live_resolv(remote, &nameserver, &previous, log);

        self.ensure_ca_trusted(remote, log)
    }
}

fn install_boot_hook(remote: &Remote, log: &mut OpLog) -> Result<(), MigrationError> {
    let current = match remote.read(BOOT_SCRIPT) {
        Ok(text) => text,
        Err(e @ MigrationError::Unreachable { .. }) => return Err(e),
        Err(_) => String::new(),
    };

    let (patched, changed) = patch_boot_script(&current);
    if !changed {
        log.step(format!("Boot hook already present in {BOOT_SCRIPT}"));
        return Ok(());
    }
    remote.upload(patched.as_bytes(), BOOT_SCRIPT)?;
    if let Err(e) = remote.run(ShellCommand::new("chmod").args(["+x", BOOT_SCRIPT])) {
        log.warn(format!("Could not mark {BOOT_SCRIPT} executable: {e}"));
    }
    log.step(format!("Installed boot hook in {BOOT_SCRIPT}"));
    Ok(())
}

/// Start from a pristine script (backing it up once, or restoring the backup) and add the hook.
fn patch_live_dhcp_script(
    remote: &Remote,
    script: &str,
    log: &mut OpLog,
) -> Result<(), MigrationError> {
    if !remote.exists(script)? {
        log.warn(format!("{script} not found, skipping"));
        return Ok(());
    }

    let original = original_of(script);
    if remote.exists(&original)? {
        remote.copy(&original, script, log)?;
        log.step(format!("Reset {script} from {original}"));
    } else {
        let current = remote.read(script)?;
        if current.contains(HOOK_BEGIN) {
            // Patched by the boot hook before any backup existed.
            let (clean, _) = strip_dhcp_hook(&current);
            remote.upload(clean.as_bytes(), &original)?;
            log.step(format!("Backed up {script} to {original} without the hook"));
        } else {
            remote.backup_once(script, log)?;
        }
    }

    let current = remote.read(script)?;
    let (patched, changed) = patch_dhcp_script(&current);
    if changed {
        remote.upload(patched.as_bytes(), script)?;
        log.step(format!("Added DNS hook to {script}"));
    }
    Ok(())
}

/// Put the nameserver at the top of the running resolv.conf so it applies before the next lease.
///
/// Lines of an earlier priority nameserver (`previous`) are dropped along with duplicates.
fn apply_to_live_resolv(remote: &Remote, nameserver: &str, previous: &str, log: &mut OpLog) {
    if let Err(e) = remote.run(ShellCommand::new("chattr").args(["-i", RESOLV_CONF])) {
        log.warn(format!("Could not clear the immutable flag on {RESOLV_CONF}: {e}"));
    }

    let current = match remote.read(RESOLV_CONF) {
        Ok(text) => text,
        Err(e) => {
            log.warn(format!("Could not read {RESOLV_CONF}: {e}"));
            return;
        }
    };
    let stale: Vec<&str> = previous
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .chain([nameserver.trim()])
        .collect();
    let rest: String = current
        .lines()
        .filter(|l| !stale.contains(&l.trim()))
        .map(|l| format!("{l}\n"))
        .collect();
    let updated = format!("{nameserver}{rest}");
    if updated == current {
        log.step(format!("{RESOLV_CONF} already prefers the local nameserver"));
        return;
    }
    if let Err(e) = remote.backup_once(RESOLV_CONF, log) {
        log.warn(format!("Could not back up {RESOLV_CONF}: {e}"));
        return;
    }
    match remote.upload(updated.as_bytes(), RESOLV_CONF) {
        Ok(()) => log.step(format!("Prepended local nameserver to {RESOLV_CONF}")),
        Err(e) => log.warn(format!("Could not update {RESOLV_CONF}: {e}")),
    }
}
