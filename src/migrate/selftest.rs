//! Connectivity checks run from the speaker toward the local service.

use std::net::Ipv6Addr;

use crate::errors::{MigrationError, OperationFailed};
use crate::hosts::{add_entry, remove_entries};
use crate::paths::{HOSTS_FILE, SELFTEST_CA, SELFTEST_HOST, VENDOR_DOMAINS};
use crate::shell::{ShellCommand, ShellError};

use super::dns_probe::{build_query, parse_od_hex, parse_response, printf_escape};
use super::remote::Remote;
use super::utils::{https_preview, redirect_host, OpLog};
use super::MigrationManager;

/// Status code curl reports when no HTTP response arrived.
const NO_RESPONSE: &str = "000";

/// Fetch `url` from the speaker and return the HTTP status code.
fn http_probe(remote: &Remote, url: &str, cacert: Option<&str>) -> Result<String, MigrationError> {
    let mut cmd = ShellCommand::new("curl").args(["-s", "-o", "/dev/null", "-w", "%{http_code}", "-m", "5"]);
    if let Some(ca) = cacert {
        cmd = cmd.args(["--cacert", ca]);
    }
    let cmd = cmd.arg(url);

    let code = match remote.try_run(&cmd) {
        Ok(out) => out.trim().to_string(),
        Err(ShellError::Failed { output, .. }) => {
            return Err(MigrationError::RemoteCommand {
                command: cmd.render(),
                output,
            })
        }
        Err(ShellError::Connect(reason)) => {
            return Err(MigrationError::Unreachable {
                host: remote.host().to_string(),
                reason,
            })
        }
    };
    if code.is_empty() || code == NO_RESPONSE {
        return Err(MigrationError::RemoteCommand {
            command: cmd.render(),
            output: "no HTTP response".to_string(),
        });
    }
    Ok(code)
}

/// `target` with its host swapped for `host`.
fn with_host(target: &str, host: &str) -> String {
    let host = match host.parse::<Ipv6Addr>() {
        Ok(_) => format!("[{host}]"),
        Err(_) => host.to_string(),
    };
    let host = host.as_str();
    match url::Url::parse(target) {
        Ok(mut url) => match url.set_host(Some(host)) {
            Ok(()) => url.to_string(),
            Err(_) => format!("http://{host}/"),
        },
        Err(_) => format!("http://{host}/"),
    }
}

fn finish(log: OpLog, result: Result<(), MigrationError>) -> Result<String, OperationFailed> {
    match result {
        Ok(()) => Ok(log.finish()),
        Err(e) => Err(log.fail(e)),
    }
}

impl MigrationManager {
    /// Plain HTTP reachability of the target from the speaker.
    pub fn test_connection(
        &self,
        device: &str,
        target: Option<&str>,
    ) -> Result<String, OperationFailed> {
        let target = self.target_or_default(target);
        let remote = self.remote(device);
        let mut log = OpLog::default();
        log.step(format!("Testing HTTP from {device} to {target}"));

        let result = http_probe(&remote, target, None).map(|code| {
            log.step(format!("HTTP {target} answered with status {code}"));
        });
        finish(log, result)
    }

    /// Route a throwaway hostname through /etc/hosts and probe it over HTTP and HTTPS.
    ///
    /// The synthetic hosts entry and the uploaded CA are removed afterwards,
    /// whatever the probes returned.
    pub fn test_hosts_redirection(
        &self,
        device: &str,
        target: Option<&str>,
    ) -> Result<String, OperationFailed> {
        let target = self.target_or_default(target);
        let remote = self.remote(device);
        let mut log = OpLog::default();
        log.step(format!("Testing hosts redirection from {device} to {target}"));

        let host = match redirect_host(target) {
            Ok(host) => host,
            Err(e) => return Err(log.fail(e)),
        };
        if let Err(e) = remote.ensure_writable(&mut log) {
            return Err(log.fail(e));
        }
        let ip = self.resolve_ip(&remote, &host, &mut log);

        let hosts = match remote.read(HOSTS_FILE) {
            Ok(text) => text,
            Err(e) => return Err(log.fail(e)),
        };
        if let Err(e) = remote.upload(add_entry(&hosts, &ip, SELFTEST_HOST).as_bytes(), HOSTS_FILE) {
            return Err(log.fail(e));
        }
        log.step(format!("Added temporary entry {ip} {SELFTEST_HOST}"));

        let result = self.run_redirect_probes(&remote, target, &mut log);

        match remote
            .read(HOSTS_FILE)
            .and_then(|now| remote.upload(remove_entries(&now, SELFTEST_HOST).as_bytes(), HOSTS_FILE))
        {
            Ok(()) => log.step(format!("Removed temporary entry for {SELFTEST_HOST}")),
            Err(e) => log.warn(format!("Could not remove temporary hosts entry: {e}")),
        }
        let _ = remote.remove(SELFTEST_CA);

        finish(log, result)
    }

    fn run_redirect_probes(
        &self,
        remote: &Remote,
        target: &str,
        log: &mut OpLog,
    ) -> Result<(), MigrationError> {
        let http_url = with_host(target, SELFTEST_HOST);
        let code = http_probe(remote, &http_url, None)?;
        log.step(format!("HTTP {http_url} answered with status {code}"));

        let pem = self.ca_pem()?;
        remote.upload(pem.as_bytes(), SELFTEST_CA)?;
        let https_url = https_preview(&http_url);
        let code = http_probe(remote, &https_url, Some(SELFTEST_CA))?;
        log.step(format!(
            "HTTPS {https_url} answered with status {code} (verified against local CA)"
        ));
        Ok(())
    }

    /// Send a hand-built A query for a vendor domain from the speaker to the local DNS service.
    pub fn test_dns_redirection(
        &self,
        device: &str,
        target: Option<&str>,
    ) -> Result<String, OperationFailed> {
        let target = self.target_or_default(target);
        let remote = self.remote(device);
        let mut log = OpLog::default();

        let port = match self.store.dns_settings() {
            Ok(settings) => settings.port().unwrap_or(53),
            Err(e) => return Err(log.fail(MigrationError::Store(format!("{e:#}")))),
        };
        let host = match redirect_host(target) {
            Ok(host) => host,
            Err(e) => return Err(log.fail(e)),
        };
        let server = self.resolve_ip(&remote, &host, &mut log);
        let domain = VENDOR_DOMAINS[0];
        log.step(format!(
            "Testing DNS from {device}: A {domain} via {server}:{port}"
        ));

        let id = (std::process::id() & 0xFFFF) as u16;
        let port = port.to_string();
        let query = build_query(id, domain);
        let cmd = ShellCommand::new("printf")
            .arg(printf_escape(&query))
            .pipe(
                ShellCommand::new("nc").args(["-u", "-w", "2", server.as_str(), port.as_str()]),
            )
            .pipe(ShellCommand::new("od").args(["-An", "-tx1", "-v"]));

        let result = remote.run(cmd.clone()).and_then(|out| {
            let response = parse_od_hex(&out);
            let addrs = parse_response(&response, id).map_err(|reason| {
                MigrationError::RemoteCommand {
                    command: cmd.render(),
                    output: reason,
                }
            })?;
            if addrs.is_empty() {
                return Err(MigrationError::RemoteCommand {
                    command: cmd.render(),
                    output: format!("no A record for {domain}"),
                });
            }
            let listed: Vec<String> = addrs.iter().map(ToString::to_string).collect();
            log.step(format!("DNS answered {domain} -> {}", listed.join(", ")));
            if !listed.iter().any(|a| *a == server) {
                log.warn(format!("Answer does not include the service address {server}"));
            }
            Ok(())
        });
        finish(log, result)
    }
}
