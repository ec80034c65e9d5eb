//! Remote shell access to a speaker.

use thiserror::Error;

mod command;
mod ssh;

pub use command::{quote, ShellCommand, Stage};
pub use ssh::{SshOptions, SshShell};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The transport never reached the device.
    #[error("cannot connect: {0}")]
    Connect(String),

    /// The command ran and exited non-zero.
    #[error("exit status {status}: {output}")]
    Failed { status: i32, output: String },
}

impl ShellError {
    pub fn is_connect(&self) -> bool {
        matches!(self, ShellError::Connect(_))
    }
}

/// Command execution and file upload on a speaker, addressed per call.
///
/// Implementations own connection handling and timeouts; every call is an
/// independent round-trip as far as callers are concerned.
pub trait RemoteShell: Send + Sync {
    /// Run `command` and return its stdout.
    fn run(&self, host: &str, command: &ShellCommand) -> Result<String, ShellError>;

    /// Write `data` to `remote_path`, replacing any existing file.
    fn upload(&self, host: &str, data: &[u8], remote_path: &str) -> Result<(), ShellError>;
}
