use anyhow::{Context, Result};
use tracing::info;

use crate::MigrationMethod;

use super::{build_manager, report, GlobalOpts, TargetArgs};

pub(crate) fn run_migrate(
    global: &GlobalOpts,
    device: &str,
    target: &TargetArgs,
    method: MigrationMethod,
) -> Result<()> {
    let manager = build_manager(global);
    let routing = target.routing();
    info!(device, %method, "starting migration");
    report(manager.migrate_speaker(
        device,
        target.target.as_deref(),
        target.proxy.as_deref(),
        &routing,
        method,
    ))
}

pub(crate) fn run_revert(global: &GlobalOpts, device: &str) -> Result<()> {
    let manager = build_manager(global);
    info!(device, "reverting migration");
    report(manager.revert_migration(device))
}

pub(crate) fn run_reboot(global: &GlobalOpts, device: &str) -> Result<()> {
    let manager = build_manager(global);
    let message = manager
        .reboot_speaker(device)
        .with_context(|| format!("Failed to reboot {device}"))?;
    println!("{message}");
    Ok(())
}
