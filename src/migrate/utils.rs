use tracing::{info, warn};

use crate::detect::{parse_target, target_host};
use crate::errors::{MigrationError, OperationFailed};

/// Human-readable transcript of one manager operation.
#[derive(Debug, Default)]
pub(crate) struct OpLog {
    lines: Vec<String>,
}

impl OpLog {
    pub(crate) fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.lines.push(message);
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.lines.push(format!("WARNING: {message}"));
    }

    pub(crate) fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub(crate) fn finish(self) -> String {
        self.text()
    }

    /// Close the log with `error` and wrap both for the caller.
    pub(crate) fn fail(mut self, error: MigrationError) -> OperationFailed {
        self.lines.push(format!("ERROR: {error}"));
        OperationFailed::new(self.text(), error)
    }
}

/// Hostname of `target`, rejecting values that cannot be redirected to.
pub(crate) fn redirect_host(target: &str) -> Result<String, MigrationError> {
    let host = target_host(target);
    if host.is_empty() {
        return Err(MigrationError::InvalidTarget {
            url: target.to_string(),
            reason: "no valid hostname".to_string(),
        });
    }
    if host.eq_ignore_ascii_case("localhost") {
        return Err(MigrationError::InvalidTarget {
            url: target.to_string(),
            reason: "localhost would point the speaker at itself".to_string(),
        });
    }
    Ok(host)
}

/// The https:// form of `target` on the default port, as the redirected speaker will see it.
pub(crate) fn https_preview(target: &str) -> String {
    match parse_target(target) {
        Some(mut url) => {
            if url.set_scheme("https").is_ok() {
                let _ = url.set_port(None);
            }
            url.to_string()
        }
        None => format!("https://{}/", target.trim().trim_end_matches('/')),
    }
}
