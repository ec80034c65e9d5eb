use crate::errors::{MigrationError, OperationFailed};
use crate::paths::TRUST_BUNDLE;
use crate::trust::{inject_block, is_trusted, remove_block};

use super::remote::Remote;
use super::utils::OpLog;
use super::MigrationManager;

impl MigrationManager {
    pub(crate) fn check_trust(&self, remote: &Remote) -> Result<bool, MigrationError> {
        let pem = self.ca_pem()?;
        let bundle = remote.read(TRUST_BUNDLE)?;
        Ok(is_trusted(&bundle, &pem))
    }

    /// Inject the CA unless the bundle already trusts it.
    pub(crate) fn ensure_ca_trusted(
        &self,
        remote: &Remote,
        log: &mut OpLog,
    ) -> Result<(), MigrationError> {
        match self.check_trust(remote) {
            Ok(true) => {
                log.step("Local CA already trusted by the speaker");
                Ok(())
            }
            Ok(false) => self.inject_ca(remote, log),
            Err(e @ MigrationError::Authority(_)) => Err(e),
            Err(e) => {
                log.warn(format!("Trust check failed ({e}); injecting anyway"));
                self.inject_ca(remote, log)
            }
        }
    }

    /// Replace any previous labeled block with the current CA.
    pub(crate) fn inject_ca(&self, remote: &Remote, log: &mut OpLog) -> Result<(), MigrationError> {
        let pem = self.ca_pem()?;
        let bundle = remote.read(TRUST_BUNDLE)?;
        remote.backup_once(TRUST_BUNDLE, log)?;
        let updated = inject_block(&bundle, &pem);
        remote.upload(updated.as_bytes(), TRUST_BUNDLE)?;
        log.step(format!("Added local CA to {TRUST_BUNDLE}"));
        Ok(())
    }

    pub(crate) fn remove_ca(&self, remote: &Remote, log: &mut OpLog) -> Result<(), MigrationError> {
        let bundle = remote.read(TRUST_BUNDLE)?;
        let (updated, changed) = remove_block(&bundle);
        if !changed {
            log.step(format!("No local CA block in {TRUST_BUNDLE}"));
            return Ok(());
        }
        remote.upload(updated.as_bytes(), TRUST_BUNDLE)?;
        log.step(format!("Removed local CA from {TRUST_BUNDLE}"));
        Ok(())
    }

    /// Whether the speaker's bundle trusts the local CA.
    pub fn trust_status(&self, device: &str) -> Result<bool, MigrationError> {
        self.check_trust(&self.remote(device))
    }

    pub fn trust_ca(&self, device: &str) -> Result<String, OperationFailed> {
        let remote = self.remote(device);
        let mut log = OpLog::default();
        let result = remote
            .ensure_writable(&mut log)
            .and_then(|_| self.inject_ca(&remote, &mut log));
        match result {
            Ok(()) => Ok(log.finish()),
            Err(e) => Err(log.fail(e)),
        }
    }

    pub fn untrust_ca(&self, device: &str) -> Result<String, OperationFailed> {
        let remote = self.remote(device);
        let mut log = OpLog::default();
        let result = remote
            .ensure_writable(&mut log)
            .and_then(|_| self.remove_ca(&remote, &mut log));
        match result {
            Ok(()) => Ok(log.finish()),
            Err(e) => Err(log.fail(e)),
        }
    }
}
