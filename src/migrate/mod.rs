//! Reconfigure a speaker so its cloud traffic reaches the local service, and undo it.

use std::sync::Arc;
use tracing::debug;

use crate::authority::CertificateAuthority;
use crate::errors::{MigrationError, OperationFailed};
use crate::paths::{HOSTS_FILE, PRIVATE_CONFIG};
use crate::shell::{RemoteShell, ShellCommand};
use crate::store::{write_atomic, DeviceStore};
use crate::types::{DnsStatus, MigrationMethod, RoutingOptions};

mod dns_hook;
pub mod dns_probe;
mod hosts_redirect;
mod remote;
mod resolve;
mod revert;
mod selftest;
mod services;
mod summary;
mod trust_store;
mod utils;
mod xml_config;

pub use resolve::parse_ping_address;
pub use summary::parse_device_info;

use remote::Remote;
use utils::OpLog;

/// Reports whether the local DNS-redirection service is up, when the host process knows.
pub type DnsStatusFn = Arc<dyn Fn() -> DnsStatus + Send + Sync>;

/// Inputs shared by every migration strategy.
pub(crate) struct MigrationPlan<'a> {
    pub(crate) target: &'a str,
    pub(crate) proxy: &'a str,
    pub(crate) routing: &'a RoutingOptions,
}

/// Stateless coordinator over the shell, store and CA collaborators.
///
/// Operations against different speakers may run concurrently. Operations
/// against the same speaker are not serialized here.
pub struct MigrationManager {
    shell: Arc<dyn RemoteShell>,
    store: Arc<dyn DeviceStore>,
    authority: Arc<dyn CertificateAuthority>,
    base_url: String,
    dns_status: Option<DnsStatusFn>,
}

impl MigrationManager {
    pub fn new(
        shell: Arc<dyn RemoteShell>,
        store: Arc<dyn DeviceStore>,
        authority: Arc<dyn CertificateAuthority>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            shell,
            store,
            authority,
            base_url: base_url.into(),
            dns_status: None,
        }
    }

    /// Attach a live status check for the DNS-redirection service.
    pub fn with_dns_status(mut self, status: DnsStatusFn) -> Self {
        self.dns_status = Some(status);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn remote<'a>(&'a self, device: &'a str) -> Remote<'a> {
        Remote::new(self.shell.as_ref(), device)
    }

    fn target_or_default<'a>(&'a self, target: Option<&'a str>) -> &'a str {
        target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.base_url)
    }

    fn ca_pem(&self) -> Result<String, MigrationError> {
        self.authority
            .cert_pem()
            .map_err(|e| MigrationError::Authority(format!("{e:#}")))
    }

    /// Redirect `device` to `target` with the chosen method.
    ///
    /// Returns the operation log. On failure the log gathered so far travels in
    /// the error; steps that already ran are not undone.
    pub fn migrate_speaker(
        &self,
        device: &str,
        target: Option<&str>,
        proxy: Option<&str>,
        routing: &RoutingOptions,
        method: MigrationMethod,
    ) -> Result<String, OperationFailed> {
        let target = self.target_or_default(target);
        let proxy = proxy
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(target);
        let plan = MigrationPlan {
            target,
            proxy,
            routing,
        };
        let remote = self.remote(device);
        let mut log = OpLog::default();
        log.step(format!(
            "Migrating {device} to {target} using the {method} method"
        ));

        self.backup_off_device(&remote, &mut log);

        if let Err(err) = remote.ensure_writable(&mut log) {
            return Err(log.fail(err));
        }

        let result = match method {
            MigrationMethod::Xml => self.migrate_xml(&remote, &plan, &mut log),
            MigrationMethod::Hosts => self.migrate_hosts(&remote, &plan, &mut log),
            MigrationMethod::Resolv => self.migrate_resolv(&remote, &plan, &mut log),
        };

        match result {
            Ok(()) => {
                log.step("Migration finished. Reboot the speaker to apply the new endpoints.");
                Ok(log.finish())
            }
            Err(err) => Err(log.fail(err)),
        }
    }

    /// Copy the current config and hosts file into the store's backup directory.
    fn backup_off_device(&self, remote: &Remote, log: &mut OpLog) {
        let dir = match self.store.backup_dir(remote.host()) {
            Ok(dir) => dir,
            Err(e) => {
                log.warn(format!("Local backup skipped: {e:#}"));
                return;
            }
        };

        for (path, name) in [
            (PRIVATE_CONFIG, "SoundTouchSdkPrivateCfg.xml"),
            (HOSTS_FILE, "hosts"),
        ] {
            let content = match remote.read(path) {
                Ok(content) => content,
                Err(e) => {
                    log.warn(format!("Local backup of {path} skipped: {e}"));
                    continue;
                }
            };
            let dest = dir.join(name);
            match write_atomic(&dest, content.as_bytes()) {
                Ok(()) => log.step(format!("Saved local copy of {path} to {}", dest.display())),
                Err(e) => log.warn(format!("Local backup of {path} failed: {e:#}")),
            }
        }
    }

    /// Reboot the speaker. Nothing else in the manager reboots.
    pub fn reboot_speaker(&self, device: &str) -> Result<String, MigrationError> {
        debug!(device, "rebooting speaker");
        self.remote(device).run(ShellCommand::new("reboot"))?;
        Ok(format!("Reboot requested for {device}"))
    }
}
