use std::io::Write;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;
use tracing::{debug, trace};

use super::command::quote;
use super::{RemoteShell, ShellCommand, ShellError};

/// ssh exits with 255 when the connection itself fails.
const SSH_CONNECT_FAILURE: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshOptions {
    pub user: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Re-enable the RSA host key and pubkey algorithms older speaker firmware still uses.
    pub legacy_algorithms: bool,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            port: 22,
            connect_timeout: Duration::from_secs(10),
            legacy_algorithms: true,
        }
    }
}

/// Transport driving the system `ssh` binary, one process per round-trip.
#[derive(Debug, Clone, Default)]
pub struct SshShell {
    options: SshOptions,
}

impl SshShell {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    fn base_command(&self, host: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(["-o", "BatchMode=yes"])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!(
                "ConnectTimeout={}",
                self.options.connect_timeout.as_secs().max(1)
            ));
        if self.options.legacy_algorithms {
            cmd.args(["-o", "HostKeyAlgorithms=+ssh-rsa"])
                .args(["-o", "PubkeyAcceptedAlgorithms=+ssh-rsa"]);
        }
        cmd.arg("-p")
            .arg(self.options.port.to_string())
            .arg(format!("{}@{}", self.options.user, host));
        cmd
    }
}

fn classify(output: Output) -> Result<String, ShellError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let status = output.status.code().unwrap_or(-1);
    if status == SSH_CONNECT_FAILURE {
        return Err(ShellError::Connect(stderr.trim().to_string()));
    }
    // Keep stdout too: some probes print useful output before failing.
    let combined = format!("{stdout}{stderr}");
    Err(ShellError::Failed {
        status,
        output: combined.trim().to_string(),
    })
}

/// Feed `data` to the child's stdin and reap it, even when the write fails.
fn stream_to(mut child: Child, data: &[u8]) -> Result<(), ShellError> {
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(data),
        None => Ok(()),
    };

    let output = child.wait_with_output().map_err(|e| ShellError::Failed {
        status: -1,
        output: format!("failed to wait for ssh: {e}"),
    })?;
    match (written, classify(output)) {
        (_, Err(err @ ShellError::Connect(_))) => Err(err),
        (Err(e), _) => Err(ShellError::Failed {
            status: -1,
            output: format!("failed to stream upload: {e}"),
        }),
        (Ok(()), result) => result.map(|_| ()),
    }
}

impl RemoteShell for SshShell {
    fn run(&self, host: &str, command: &ShellCommand) -> Result<String, ShellError> {
        let rendered = command.render();
        debug!(host, command = %rendered, "ssh run");

        let output = self
            .base_command(host)
            .arg(&rendered)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ShellError::Connect(format!("failed to spawn ssh: {e}")))?;
        let result = classify(output);
        trace!(host, ?result, "ssh result");
        result
    }

    fn upload(&self, host: &str, data: &[u8], remote_path: &str) -> Result<(), ShellError> {
        debug!(host, path = remote_path, bytes = data.len(), "ssh upload");

        let child = self
            .base_command(host)
            .arg(format!("cat > {}", quote(remote_path)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ShellError::Connect(format!("failed to spawn ssh: {e}")))?;

        stream_to(child, data)
    }
}
