use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("SSH connection to {host} failed: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("Remote command `{command}` failed: {output}")]
    RemoteCommand { command: String, output: String },

    #[error("Upload to {path} failed: {reason}")]
    Upload { path: String, reason: String },

    #[error("Cannot get write access on the speaker: {0}")]
    NoWriteAccess(String),

    #[error("No backup found at {path}; refusing to revert without an original copy")]
    NoBackup { path: String },

    #[error("Invalid target URL {url}: {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("DNS redirection is disabled in settings. Enable it before using the resolv method.")]
    DnsDisabled,

    #[error("DNS redirection must be bound to port 53 (configured: {bind})")]
    DnsWrongPort { bind: String },

    #[error("DNS redirection service is not running on port 53 ({0})")]
    DnsNotRunning(String),

    #[error("Failed to encode speaker configuration: {0}")]
    ConfigEncode(String),

    #[error("Failed to parse speaker configuration: {0}")]
    ConfigParse(String),

    #[error("Could not create the remote services marker in any known location")]
    RemoteServicesUnavailable,

    #[error("Certificate authority unavailable: {0}")]
    Authority(String),

    #[error("Device store error: {0}")]
    Store(String),
}

/// A failed manager operation together with everything it logged before failing.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct OperationFailed {
    pub log: String,
    #[source]
    pub source: MigrationError,
}

impl OperationFailed {
    pub fn new(log: impl Into<String>, source: MigrationError) -> Self {
        Self {
            log: log.into(),
            source,
        }
    }
}
