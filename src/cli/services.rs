use anyhow::{Context, Result};

use super::{build_manager, GlobalOpts, Toggle};

pub(crate) fn run_services(global: &GlobalOpts, device: &str, action: Toggle) -> Result<()> {
    let manager = build_manager(global);
    match action {
        Toggle::Enable => {
            let location = manager
                .ensure_remote_services(device)
                .with_context(|| format!("Failed to enable remote services on {device}"))?;
            println!("Remote services enabled ({location})");
        }
        Toggle::Disable => {
            let cleared = manager
                .remove_remote_services(device)
                .with_context(|| format!("Failed to disable remote services on {device}"))?;
            println!("Remote services disabled ({})", cleared.join(", "));
        }
    }
    Ok(())
}
