//! File-level helpers over the remote shell for one speaker.

use crate::errors::MigrationError;
use crate::paths::original_of;
use crate::shell::{RemoteShell, ShellCommand, ShellError};

use super::utils::OpLog;

pub(crate) struct Remote<'a> {
    shell: &'a dyn RemoteShell,
    host: &'a str,
}

fn to_migration_error(host: &str, command: &ShellCommand, err: ShellError) -> MigrationError {
    match err {
        ShellError::Connect(reason) => MigrationError::Unreachable {
            host: host.to_string(),
            reason,
        },
        ShellError::Failed { output, .. } => MigrationError::RemoteCommand {
            command: command.render(),
            output,
        },
    }
}

impl<'a> Remote<'a> {
    pub(crate) fn new(shell: &'a dyn RemoteShell, host: &'a str) -> Self {
        Self { shell, host }
    }

    pub(crate) fn host(&self) -> &str {
        self.host
    }

    pub(crate) fn try_run(&self, command: &ShellCommand) -> Result<String, ShellError> {
        self.shell.run(self.host, command)
    }

    pub(crate) fn run(&self, command: ShellCommand) -> Result<String, MigrationError> {
        self.try_run(&command)
            .map_err(|e| to_migration_error(self.host, &command, e))
    }

    pub(crate) fn read(&self, path: &str) -> Result<String, MigrationError> {
        self.run(ShellCommand::new("cat").arg(path))
    }

    /// Whether `path` is a regular file. Only a failed connection is an error.
    pub(crate) fn exists(&self, path: &str) -> Result<bool, MigrationError> {
        match self.try_run(&ShellCommand::new("test").args(["-f", path])) {
            Ok(_) => Ok(true),
            Err(ShellError::Connect(reason)) => Err(MigrationError::Unreachable {
                host: self.host.to_string(),
                reason,
            }),
            Err(ShellError::Failed { .. }) => Ok(false),
        }
    }

    pub(crate) fn upload(&self, data: &[u8], path: &str) -> Result<(), MigrationError> {
        self.shell
            .upload(self.host, data, path)
            .map_err(|e| match e {
                ShellError::Connect(reason) => MigrationError::Unreachable {
                    host: self.host.to_string(),
                    reason,
                },
                ShellError::Failed { output, .. } => MigrationError::Upload {
                    path: path.to_string(),
                    reason: output,
                },
            })
    }

    pub(crate) fn remove(&self, path: &str) -> Result<(), MigrationError> {
        self.run(ShellCommand::new("rm").args(["-f", path]))
            .map(|_| ())
    }

    /// Copy on the device, falling back to read-and-upload when `cp` is refused.
    pub(crate) fn copy(&self, from: &str, to: &str, log: &mut OpLog) -> Result<(), MigrationError> {
        match self.run(ShellCommand::new("cp").args(["-p", from, to])) {
            Ok(_) => Ok(()),
            Err(MigrationError::Unreachable { host, reason }) => {
                Err(MigrationError::Unreachable { host, reason })
            }
            Err(err) => {
                log.warn(format!(
                    "Native copy of {from} failed ({err}); copying through upload"
                ));
                let content = self.read(from)?;
                self.upload(content.as_bytes(), to)
            }
        }
    }

    /// Save `path` as `<path>.original` unless that copy already exists.
    pub(crate) fn backup_once(&self, path: &str, log: &mut OpLog) -> Result<(), MigrationError> {
        let original = original_of(path);
        if self.exists(&original)? {
            log.step(format!("Backup {original} already exists, keeping it"));
            return Ok(());
        }
        self.copy(path, &original, log)?;
        log.step(format!("Backed up {path} to {original}"));
        Ok(())
    }

    /// Copy `<path>.original` back over `path`. Returns false when no backup exists.
    pub(crate) fn restore_original(
        &self,
        path: &str,
        log: &mut OpLog,
    ) -> Result<bool, MigrationError> {
        let original = original_of(path);
        if !self.exists(&original)? {
            return Ok(false);
        }
        self.copy(&original, path, log)?;
        log.step(format!("Restored {path} from {original}"));
        Ok(true)
    }

    /// Remount the root filesystem writable, escalating if the plain form is refused.
    pub(crate) fn ensure_writable(&self, log: &mut OpLog) -> Result<(), MigrationError> {
        let remount = ShellCommand::new("mount").args(["-o", "remount,rw", "/"]);
        let plain_err = match self.try_run(&remount) {
            Ok(_) => {
                log.step("Root filesystem is writable");
                return Ok(());
            }
            Err(ShellError::Connect(reason)) => {
                return Err(MigrationError::Unreachable {
                    host: self.host.to_string(),
                    reason,
                })
            }
            Err(err) => err,
        };

        match self.try_run(&remount.privileged()) {
            Ok(_) => {
                log.step("Root filesystem is writable (privileged remount)");
                Ok(())
            }
            Err(err) => Err(MigrationError::NoWriteAccess(format!(
                "{plain_err}; privileged: {err}"
            ))),
        }
    }
}
