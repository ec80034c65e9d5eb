//! Content-based guess at whether a speaker has already been migrated.
//!
//! Nothing on the device records a migration explicitly, so this looks at the
//! artifacts each method leaves behind. It can be fooled by a speaker that was
//! pointed at a similarly named host by hand.

use crate::hosts::mentions_vendor_domain;
use crate::types::MigrationSummary;
use url::{Host, Url};

/// `target` as a URL, reading a bare `host` or `host:port` as `http://host:port`.
pub(crate) fn parse_target(target: &str) -> Option<Url> {
    let target = target.trim();
    let candidate = if target.contains("://") {
        Url::parse(target).ok()
    } else {
        Url::parse(&format!("http://{target}")).ok()
    };
    candidate.filter(|url| url.host().is_some())
}

/// Hostname or bare IP address of `target`; empty if it names no host.
pub fn target_host(target: &str) -> String {
    match parse_target(target).as_ref().and_then(Url::host) {
        Some(Host::Domain(name)) => name.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    }
}

/// True if any method's footprint is present on the summarized speaker.
pub fn is_migrated(summary: &MigrationSummary) -> bool {
    let host = target_host(&summary.target_url);

    let config_points_here = summary
        .current_config
        .as_ref()
        .map(|cfg| cfg.mentions_host(&host))
        .unwrap_or(false);

    let hosts_redirected = summary
        .current_hosts
        .as_deref()
        .map(mentions_vendor_domain)
        .unwrap_or(false)
        && summary.ca_trusted;

    let resolv_mentions_target = !host.is_empty()
        && summary
            .current_resolv
            .as_deref()
            .map(|r| r.contains(&host))
            .unwrap_or(false);
    let dns_redirected =
        (summary.dns_hook_installed || resolv_mentions_target) && summary.ca_trusted;

    config_points_here || hosts_redirected || dns_redirected
}
