use crate::config_codec::PrivateConfig;
use crate::errors::MigrationError;
use crate::paths::PRIVATE_CONFIG;

use super::remote::Remote;
use super::utils::OpLog;
use super::{MigrationManager, MigrationPlan};

impl MigrationManager {
    /// Rewrite the private endpoint configuration to point at the target.
    pub(crate) fn migrate_xml(
        &self,
        remote: &Remote,
        plan: &MigrationPlan,
        log: &mut OpLog,
    ) -> Result<(), MigrationError> {
        match self.enable_remote_services(remote) {
            Ok(path) => log.step(format!("Remote services marker present at {path}")),
            Err(e) => log.warn(format!("Could not enable remote services: {e}")),
        }

        let current = match remote.read(PRIVATE_CONFIG) {
            Ok(text) => match PrivateConfig::parse(&text) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    log.warn(format!("Current configuration unreadable: {e}"));
                    None
                }
            },
            Err(e) => {
                log.warn(format!("No current configuration: {e}"));
                None
            }
        };

        let planned = planned_config(plan, current.as_ref(), log);
        let xml = planned.to_xml()?;

        if current.is_some() || remote.exists(PRIVATE_CONFIG)? {
            remote.backup_once(PRIVATE_CONFIG, log)?;
        }

        remote.upload(xml.as_bytes(), PRIVATE_CONFIG)?;
        log.step(format!("Wrote new configuration to {PRIVATE_CONFIG}"));
        Ok(())
    }
}

/// The configuration to install, honoring per-subsystem upstream routing.
pub(crate) fn planned_config(
    plan: &MigrationPlan,
    current: Option<&PrivateConfig>,
    log: &mut OpLog,
) -> PrivateConfig {
    let mut planned = PrivateConfig::planned(plan.target);
    if !plan.routing.any_upstream() {
        return planned;
    }
    match current {
        Some(current) => {
            planned.apply_routing(current, plan.routing, plan.proxy);
            log.step(format!("Upstream subsystems routed through {}", plan.proxy));
        }
        None => log.warn("Upstream routing requested but the current URLs are unknown"),
    }
    planned
}
