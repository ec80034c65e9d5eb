use anyhow::{Context, Result};

use super::{build_manager, report, GlobalOpts, TrustAction};

pub(crate) fn run_trust(global: &GlobalOpts, device: &str, action: TrustAction) -> Result<()> {
    let manager = build_manager(global);
    match action {
        TrustAction::Add => report(manager.trust_ca(device)),
        TrustAction::Remove => report(manager.untrust_ca(device)),
        TrustAction::Status => {
            let trusted = manager
                .trust_status(device)
                .with_context(|| format!("Failed to read the trust bundle on {device}"))?;
            if trusted {
                println!("{device} trusts the local CA");
            } else {
                println!("{device} does not trust the local CA");
            }
            Ok(())
        }
    }
}
