use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::{MigrationSummary, Subsystem};

use super::{build_manager, GlobalOpts, TargetArgs};

pub(crate) fn run_summary(
    global: &GlobalOpts,
    device: &str,
    target: &TargetArgs,
    json: bool,
    diff: bool,
) -> Result<()> {
    let manager = build_manager(global);
    let routing = target.routing();
    let summary = manager
        .migration_summary(
            device,
            target.target.as_deref(),
            target.proxy.as_deref(),
            &routing,
        )
        .with_context(|| format!("Failed to summarize {device}"))?;

    let mut out = io::stdout().lock();
    if json {
        let text =
            serde_json::to_string_pretty(&summary).context("Failed to encode summary as JSON")?;
        writeln!(out, "{text}")?;
        return Ok(());
    }

    write_report(&mut out, &summary)?;
    if diff {
        write_config_diff(&mut out, &summary)?;
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn write_report(out: &mut impl Write, summary: &MigrationSummary) -> Result<()> {
    writeln!(out, "Device:            {}", summary.device_address)?;
    let identity = &summary.identity;
    for (label, value) in [
        ("Name", &identity.name),
        ("Model", &identity.model),
        ("Serial", &identity.serial),
        ("Firmware", &identity.firmware),
        ("Account", &identity.account),
    ] {
        if let Some(value) = value {
            writeln!(out, "{:<19}{value}", format!("{label}:"))?;
        }
    }
    writeln!(out, "Target:            {}", summary.target_url)?;
    writeln!(out, "Proxy:             {}", summary.proxy_url)?;
    writeln!(out, "HTTPS preview:     {}", summary.https_preview_url)?;

    if !summary.ssh_success {
        writeln!(
            out,
            "SSH:               failed ({})",
            summary.ssh_error.as_deref().unwrap_or("unknown error")
        )?;
    } else {
        writeln!(out, "SSH:               ok")?;
    }
    writeln!(
        out,
        "Remote services:   {} (persistent: {})",
        yes_no(summary.remote_services_enabled),
        yes_no(summary.remote_services_persistent)
    )?;
    writeln!(out, "Local CA trusted:  {}", yes_no(summary.ca_trusted))?;
    writeln!(out, "DNS hook:          {}", yes_no(summary.dns_hook_installed))?;
    writeln!(out, "Already migrated:  {}", yes_no(summary.already_migrated))?;

    writeln!(out)?;
    writeln!(out, "Planned endpoints:")?;
    for subsystem in Subsystem::ALL {
        let current = summary
            .current_config
            .as_ref()
            .map(|c| c.url(subsystem))
            .unwrap_or("-");
        writeln!(
            out,
            "  {:<9} {} -> {}",
            subsystem.name(),
            if current.is_empty() { "-" } else { current },
            summary.planned_config.url(subsystem)
        )?;
    }
    Ok(())
}

fn write_config_diff(out: &mut impl Write, summary: &MigrationSummary) -> Result<()> {
    let current = summary.current_config_text.as_deref().unwrap_or("");
    writeln!(out)?;
    if current == summary.planned_config_text {
        writeln!(out, "No changes.")?;
        return Ok(());
    }
    let diff = similar::TextDiff::from_lines(current, summary.planned_config_text.as_str());
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header("current", "planned")
        .to_string();
    write!(out, "{}", unified)?;
    Ok(())
}
