//! Device metadata, settings and local backup layout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{DeviceIdentity, DnsSettings};

/// A known speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub identity: DeviceIdentity,
}

/// Lookup and persistence the migration manager relies on.
pub trait DeviceStore: Send + Sync {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    fn find_device(&self, address: &str) -> Result<Option<DeviceRecord>> {
        Ok(self
            .list_devices()?
            .into_iter()
            .find(|d| d.address.eq_ignore_ascii_case(address.trim())))
    }

    fn dns_settings(&self) -> Result<DnsSettings>;

    fn set_dns_settings(&self, settings: &DnsSettings) -> Result<()>;

    /// Directory for off-device backups of `address`, created on demand.
    fn backup_dir(&self, address: &str) -> Result<PathBuf>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DevicesFile {
    #[serde(default, rename = "device")]
    devices: Vec<DeviceRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    dns: DnsSettings,
}

/// TOML-backed store rooted at a data directory:
///
/// ```text
/// <root>/devices.toml
/// <root>/settings.toml
/// <root>/backups/<device>/
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn devices_path(&self) -> PathBuf {
        self.root.join("devices.toml")
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.toml")
    }

    fn read_settings(&self) -> Result<SettingsFile> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsFile::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }
}

/// Keep backup directory names to a safe character set.
fn dir_name(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write via a temporary sibling and rename into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .with_context(|| format!("Failed to create temporary file: {}", tmp_path.display()))?;

    if let Err(e) = tmp_file.write_all(contents).and_then(|_| tmp_file.sync_all()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e)
            .with_context(|| format!("Failed to write temporary file: {}", tmp_path.display()));
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace file: {}", path.display()))
}

impl DeviceStore for FileStore {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let path = self.devices_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read device list: {}", path.display()))?;
        let file: DevicesFile = toml::from_str(&text)
            .with_context(|| format!("Failed to parse device list: {}", path.display()))?;
        Ok(file.devices)
    }

    fn dns_settings(&self) -> Result<DnsSettings> {
        Ok(self.read_settings()?.dns)
    }

    fn set_dns_settings(&self, settings: &DnsSettings) -> Result<()> {
        let mut file = self.read_settings()?;
        file.dns = settings.clone();
        let text = toml::to_string_pretty(&file).context("Failed to encode settings")?;
        write_atomic(&self.settings_path(), text.as_bytes())
    }

    fn backup_dir(&self, address: &str) -> Result<PathBuf> {
        let key = self
            .find_device(address)?
            .and_then(|d| d.id)
            .unwrap_or_else(|| address.to_string());
        let dir = self.root.join("backups").join(dir_name(&key));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create backup directory: {}", dir.display()))?;
        Ok(dir)
    }
}
