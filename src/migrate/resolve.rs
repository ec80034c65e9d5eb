use std::net::{IpAddr, ToSocketAddrs};
use tracing::debug;

use crate::detect::target_host;
use crate::shell::{ShellCommand, ShellError};

use super::remote::Remote;
use super::utils::OpLog;
use super::MigrationManager;

/// Address from the first line of `ping` output, e.g. `PING svc (10.0.0.2): 56 data bytes`.
pub fn parse_ping_address(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.trim_start().starts_with("PING"))?;
    let open = line.find('(')?;
    let close = line[open + 1..].find(')')? + open + 1;
    let candidate = line[open + 1..close].trim();
    candidate.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

fn resolve_locally(host: &str) -> Option<String> {
    let addrs: Vec<IpAddr> = (host, 0)
        .to_socket_addrs()
        .ok()?
        .map(|sa| sa.ip())
        .collect();
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .map(IpAddr::to_string)
}

impl MigrationManager {
    /// Best-effort address for `host`, as the speaker would see it. Never fails.
    ///
    /// The speaker's own resolver wins over ours so NAT or container networking
    /// between this service and the speaker cannot produce an unreachable address.
    pub(crate) fn resolve_ip(&self, remote: &Remote, host: &str, log: &mut OpLog) -> String {
        if host.parse::<IpAddr>().is_ok() {
            return host.to_string();
        }

        let ping = ShellCommand::new("ping").args(["-c", "1", "-W", "2", host]);
        let output = match remote.try_run(&ping) {
            Ok(out) => Some(out),
            Err(ShellError::Failed { output, .. }) => Some(output),
            Err(ShellError::Connect(_)) => None,
        };
        if let Some(ip) = output.as_deref().and_then(parse_ping_address) {
            log.step(format!("Speaker resolves {host} to {ip}"));
            return ip;
        }

        if let Some(ip) = resolve_locally(host) {
            log.step(format!("Resolved {host} locally to {ip}"));
            return ip;
        }

        debug!(host, "could not resolve, using hostname as-is");
        log.warn(format!("Could not resolve {host}; using the hostname as-is"));
        host.to_string()
    }

    /// Address the speaker should use to reach `target` (defaults to the base URL).
    pub fn resolve_target_ip(&self, device: &str, target: Option<&str>) -> String {
        let target = self.target_or_default(target);
        let host = target_host(target);
        let mut log = OpLog::default();
        self.resolve_ip(&self.remote(device), &host, &mut log)
    }
}
