use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config_codec::PrivateConfig;

/// How a speaker's cloud traffic gets redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationMethod {
    /// Rewrite the private endpoint configuration (default)
    #[default]
    Xml,
    /// Point vendor domains at the local service in /etc/hosts
    Hosts,
    /// Install a priority nameserver through a DHCP hook
    Resolv,
}

impl fmt::Display for MigrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationMethod::Xml => write!(f, "xml"),
            MigrationMethod::Hosts => write!(f, "hosts"),
            MigrationMethod::Resolv => write!(f, "resolv"),
        }
    }
}

/// Cloud subsystems addressed by the private configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Subsystem {
    /// Account, presets and catalog service
    Marge,
    /// Usage statistics
    Stats,
    /// Software updates
    Swupdate,
    /// Streaming service registry
    Bmx,
}

impl Subsystem {
    pub const ALL: [Subsystem; 4] = [
        Subsystem::Marge,
        Subsystem::Stats,
        Subsystem::Swupdate,
        Subsystem::Bmx,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Marge => "marge",
            Subsystem::Stats => "stats",
            Subsystem::Swupdate => "swupdate",
            Subsystem::Bmx => "bmx",
        }
    }
}

impl FromStr for Subsystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subsystem::ALL
            .into_iter()
            .find(|sub| sub.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown subsystem: {s}"))
    }
}

/// Where a subsystem's planned URL points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Straight at the target service
    #[default]
    Direct,
    /// Through the local proxy, wrapping the speaker's current URL
    Upstream,
}

/// Per-subsystem routing choices for a migration or summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingOptions {
    pub marge: Route,
    pub stats: Route,
    pub swupdate: Route,
    pub bmx: Route,
}

impl RoutingOptions {
    /// Build from a name → mode mapping. Only `"upstream"` selects passthrough; anything else is direct.
    pub fn from_map(options: &HashMap<String, String>) -> Self {
        let mut routing = RoutingOptions::default();
        for (name, mode) in options {
            let Ok(subsystem) = name.parse::<Subsystem>() else {
                continue;
            };
            let route = if mode.eq_ignore_ascii_case("upstream") {
                Route::Upstream
            } else {
                Route::Direct
            };
            routing.set(subsystem, route);
        }
        routing
    }

    pub fn upstream(subsystems: &[Subsystem]) -> Self {
        let mut routing = RoutingOptions::default();
        for sub in subsystems {
            routing.set(*sub, Route::Upstream);
        }
        routing
    }

    pub fn get(&self, subsystem: Subsystem) -> Route {
        match subsystem {
            Subsystem::Marge => self.marge,
            Subsystem::Stats => self.stats,
            Subsystem::Swupdate => self.swupdate,
            Subsystem::Bmx => self.bmx,
        }
    }

    pub fn set(&mut self, subsystem: Subsystem, route: Route) {
        match subsystem {
            Subsystem::Marge => self.marge = route,
            Subsystem::Stats => self.stats = route,
            Subsystem::Swupdate => self.swupdate = route,
            Subsystem::Bmx => self.bmx = route,
        }
    }

    pub fn any_upstream(&self) -> bool {
        Subsystem::ALL
            .into_iter()
            .any(|sub| self.get(sub) == Route::Upstream)
    }
}

/// Identity fields for a speaker, from the device store and/or the speaker itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
}

impl DeviceIdentity {
    /// Overlay `live` on top of `self`; present live values win.
    pub fn merged_with(mut self, live: DeviceIdentity) -> Self {
        fn pick(stored: &mut Option<String>, live: Option<String>) {
            if let Some(value) = live.filter(|v| !v.trim().is_empty()) {
                *stored = Some(value);
            }
        }
        pick(&mut self.name, live.name);
        pick(&mut self.model, live.model);
        pick(&mut self.serial, live.serial);
        pick(&mut self.account, live.account);
        pick(&mut self.firmware, live.firmware);
        self
    }
}

/// DNS-redirection service settings kept in the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_dns_bind")]
    pub bind: String,
}

fn default_dns_bind() -> String {
    "0.0.0.0:53".to_string()
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_dns_bind(),
        }
    }
}

impl DnsSettings {
    /// Port component of the bind address, if any.
    pub fn port(&self) -> Option<u16> {
        self.bind
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }
}

/// Live state of the DNS-redirection service, as reported by its host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsStatus {
    pub running: bool,
    pub port: u16,
}

/// Dry-run report of what a migration would change on a speaker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    pub device_address: String,
    pub target_url: String,
    pub proxy_url: String,
    pub ssh_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_config_text: Option<String>,
    pub planned_config_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_config: Option<PrivateConfig>,
    pub planned_config: PrivateConfig,
    pub planned_hosts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hosts: Option<String>,
    pub remote_services_enabled: bool,
    pub remote_services_persistent: bool,
    pub identity: DeviceIdentity,
    pub ca_trusted: bool,
    pub https_preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_resolv: Option<String>,
    pub dns_hook_installed: bool,
    pub already_migrated: bool,
}
