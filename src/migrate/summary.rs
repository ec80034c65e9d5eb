use std::io::Cursor;
use tracing::{debug, warn};
use xmltree::Element;

use crate::config_codec::PrivateConfig;
use crate::detect::{is_migrated, target_host};
use crate::errors::MigrationError;
use crate::hosts::planned_hosts;
use crate::paths::{DEVICE_INFO_URL, HOSTS_FILE, PRIORITY_NAMESERVER, PRIVATE_CONFIG, RESOLV_CONF};
use crate::shell::ShellCommand;
use crate::types::{DeviceIdentity, MigrationSummary, RoutingOptions};
use crate::xml_helpers::{child_text, descendant_text};

use super::utils::{https_preview, OpLog};
use super::xml_config::planned_config;
use super::{MigrationManager, MigrationPlan};

/// Identity fields from the speaker's `/info` document.
pub fn parse_device_info(xml: &str) -> Option<DeviceIdentity> {
    let root = Element::parse(Cursor::new(xml.as_bytes())).ok()?;
    Some(DeviceIdentity {
        name: child_text(&root, "name"),
        model: child_text(&root, "type"),
        serial: descendant_text(&root, "serialNumber"),
        account: child_text(&root, "margeAccountUUID"),
        firmware: descendant_text(&root, "softwareVersion"),
    })
}

impl MigrationManager {
    /// Dry-run report of what a migration of `device` would change. Read-only.
    ///
    /// An unreachable speaker is reported in the summary, not as an error.
    pub fn migration_summary(
        &self,
        device: &str,
        target: Option<&str>,
        proxy: Option<&str>,
        routing: &RoutingOptions,
    ) -> Result<MigrationSummary, MigrationError> {
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
        // Summaries keep their own notes out of the operation log.
        let mut notes = OpLog::default();

        let stored = match self.store.find_device(device) {
            Ok(record) => record.map(|r| r.identity).unwrap_or_default(),
            Err(e) => {
                warn!(device, "device store lookup failed: {e:#}");
                DeviceIdentity::default()
            }
        };

        let mut summary = MigrationSummary {
            device_address: device.to_string(),
            target_url: target.to_string(),
            proxy_url: proxy.to_string(),
            https_preview_url: https_preview(target),
            identity: stored,
            ..Default::default()
        };

        let reachable = match remote.read(PRIVATE_CONFIG) {
            Ok(text) => {
                summary.ssh_success = true;
                match PrivateConfig::parse(&text) {
                    Ok(cfg) => summary.current_config = Some(cfg),
                    Err(e) => debug!(device, "current config does not parse: {e}"),
                }
                summary.current_config_text = Some(text);
                true
            }
            Err(e) => {
                summary.ssh_success = false;
                summary.ssh_error = Some(e.to_string());
                !matches!(e, MigrationError::Unreachable { .. })
            }
        };

        let planned = planned_config(&plan, summary.current_config.as_ref(), &mut notes);
        summary.planned_config_text = planned.to_xml()?;
        summary.planned_config = planned;

        let host = target_host(target);
        let ip = self.resolve_ip(&remote, &host, &mut notes);
        summary.planned_hosts = planned_hosts(&ip);

        if reachable {
            let info = remote.try_run(
                &ShellCommand::new("curl").args(["-s", "-m", "5", DEVICE_INFO_URL]),
            );
            if let Some(live) = info.ok().as_deref().and_then(parse_device_info) {
                summary.identity = summary.identity.clone().merged_with(live);
            }

            summary.current_hosts = remote.read(HOSTS_FILE).ok();
            let (enabled, persistent) = self.remote_services_state(&remote);
            summary.remote_services_enabled = enabled;
            summary.remote_services_persistent = persistent;
            summary.ca_trusted = self.check_trust(&remote).unwrap_or(false);
            summary.current_resolv = remote.read(RESOLV_CONF).ok();
            summary.dns_hook_installed = remote
                .exists(PRIORITY_NAMESERVER)
                .unwrap_or(false);
        }

        summary.already_migrated = is_migrated(&summary);
        Ok(summary)
    }
}
