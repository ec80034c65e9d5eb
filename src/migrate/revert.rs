use crate::errors::{MigrationError, OperationFailed};
use crate::patch::{strip_boot_hook, strip_dhcp_hook};
use crate::paths::{
    original_of, BOOT_SCRIPT, DHCP_SCRIPTS, HOSTS_FILE, PRIORITY_NAMESERVER, PRIVATE_CONFIG,
    RESOLV_CONF,
};
use crate::shell::ShellCommand;

use super::remote::Remote;
use super::utils::OpLog;
use super::MigrationManager;

impl MigrationManager {
    /// Undo whatever any migration method left behind.
    ///
    /// The primary configuration must have a backup; everything after it is
    /// best-effort and only logged. Does not reboot and leaves the
    /// remote-services marker in place.
    pub fn revert_migration(&self, device: &str) -> Result<String, OperationFailed> {
        let remote = self.remote(device);
        let mut log = OpLog::default();
        log.step(format!("Reverting migration on {device}"));

        let original = original_of(PRIVATE_CONFIG);
        match remote.exists(&original) {
            Ok(true) => {}
            Ok(false) => return Err(log.fail(MigrationError::NoBackup { path: original })),
            Err(e) => return Err(log.fail(e)),
        }
        if let Err(e) = remote.ensure_writable(&mut log) {
            return Err(log.fail(e));
        }
        match remote.restore_original(PRIVATE_CONFIG, &mut log) {
            Ok(true) => {}
            Ok(false) => return Err(log.fail(MigrationError::NoBackup { path: original })),
            Err(e) => return Err(log.fail(e)),
        }

        restore_secondary(&remote, HOSTS_FILE, &mut log);

        if let Err(e) = remote.run(ShellCommand::new("chattr").args(["-i", RESOLV_CONF])) {
            log.warn(format!("Could not clear the immutable flag on {RESOLV_CONF}: {e}"));
        }
        restore_secondary(&remote, RESOLV_CONF, &mut log);

        remove_dns_hook(&remote, &mut log);

        if let Err(e) = self.remove_ca(&remote, &mut log) {
            log.warn(format!("Could not remove local CA: {e}"));
        }

        log.step("Revert finished. Reboot the speaker to apply the original endpoints.");
        Ok(log.finish())
    }
}

fn restore_secondary(remote: &Remote, path: &str, log: &mut OpLog) {
    match remote.restore_original(path, log) {
        Ok(true) => {}
        Ok(false) => log.step(format!("No backup of {path}, leaving it as is")),
        Err(e) => log.warn(format!("Could not restore {path}: {e}")),
    }
}

/// A boot script we created ourselves holds nothing but the interpreter line once the hook is gone.
fn only_shebang(script: &str) -> bool {
    script
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with("#!"))
}

fn remove_dns_hook(remote: &Remote, log: &mut OpLog) {
    match remote.remove(PRIORITY_NAMESERVER) {
        Ok(()) => log.step(format!("Removed {PRIORITY_NAMESERVER}")),
        Err(e) => log.warn(format!("Could not remove {PRIORITY_NAMESERVER}: {e}")),
    }

    match remote.read(BOOT_SCRIPT) {
        Ok(text) => {
            let (stripped, changed) = strip_boot_hook(&text);
            if !changed {
                log.step(format!("No boot hook in {BOOT_SCRIPT}"));
            } else if only_shebang(&stripped) {
                match remote.remove(BOOT_SCRIPT) {
                    Ok(()) => log.step(format!("Removed placeholder {BOOT_SCRIPT}")),
                    Err(e) => log.warn(format!("Could not remove {BOOT_SCRIPT}: {e}")),
                }
            } else {
                match remote.upload(stripped.as_bytes(), BOOT_SCRIPT) {
                    Ok(()) => log.step(format!("Removed boot hook from {BOOT_SCRIPT}")),
                    Err(e) => log.warn(format!("Could not update {BOOT_SCRIPT}: {e}")),
                }
            }
        }
        Err(_) => log.step(format!("No {BOOT_SCRIPT} on the speaker")),
    }

    for script in DHCP_SCRIPTS {
        match remote.restore_original(script, log) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                log.warn(format!("Could not restore {script}: {e}"));
                continue;
            }
        }
        // No backup: strip the hook in place if the script carries one.
        let Ok(text) = remote.read(script) else {
            continue;
        };
        let (stripped, changed) = strip_dhcp_hook(&text);
        if changed {
            match remote.upload(stripped.as_bytes(), script) {
                Ok(()) => log.step(format!("Removed DNS hook from {script}")),
                Err(e) => log.warn(format!("Could not update {script}: {e}")),
            }
        }
    }
}
