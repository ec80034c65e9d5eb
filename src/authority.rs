//! Access to the local certificate authority's material.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The slice of the certificate authority the migration manager needs.
pub trait CertificateAuthority: Send + Sync {
    fn cert_path(&self) -> &Path;

    fn key_path(&self) -> &Path;

    /// PEM text of the CA certificate.
    fn cert_pem(&self) -> Result<String>;
}

/// CA stored as PEM files on disk.
#[derive(Debug, Clone)]
pub struct FileAuthority {
    cert: PathBuf,
    key: PathBuf,
}

impl FileAuthority {
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }
}

impl CertificateAuthority for FileAuthority {
    fn cert_path(&self) -> &Path {
        &self.cert
    }

    fn key_path(&self) -> &Path {
        &self.key
    }

    fn cert_pem(&self) -> Result<String> {
        let pem = fs::read_to_string(&self.cert)
            .with_context(|| format!("Failed to read CA certificate: {}", self.cert.display()))?;
        if !pem.contains("-----BEGIN CERTIFICATE-----") {
            bail!(
                "CA certificate is not PEM encoded: {}",
                self.cert.display()
            );
        }
        Ok(pem)
    }
}
