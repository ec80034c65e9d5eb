use anyhow::{bail, Result};

use crate::DeviceStore;

use super::{build_store, GlobalOpts, Toggle};

pub(crate) fn run_dns(global: &GlobalOpts, action: Toggle, bind: Option<String>) -> Result<()> {
    let store = build_store(global);
    let mut settings = store.dns_settings()?;

    settings.enabled = matches!(action, Toggle::Enable);
    if let Some(bind) = bind {
        let bind = bind.trim().to_string();
        if bind.rsplit_once(':').and_then(|(_, p)| p.parse::<u16>().ok()).is_none() {
            bail!("Invalid DNS bind address '{bind}': expected HOST:PORT");
        }
        settings.bind = bind;
    }
    store.set_dns_settings(&settings)?;

    println!(
        "DNS redirection {} (bind {})",
        if settings.enabled { "enabled" } else { "disabled" },
        settings.bind
    );
    if settings.enabled && settings.port() != Some(53) {
        eprintln!("Warning: the resolv method needs the DNS service on port 53");
    }
    Ok(())
}
