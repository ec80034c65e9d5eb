pub mod authority;
pub mod cli;
mod config_codec;
pub mod detect;
mod errors;
pub mod hosts;
pub mod migrate;
pub mod patch;
pub mod paths;
pub mod shell;
pub mod store;
pub mod trust;
mod types;
mod xml_helpers;

pub use authority::{CertificateAuthority, FileAuthority};
pub use config_codec::{proxied_url, PrivateConfig};
pub use detect::is_migrated;
pub use errors::{MigrationError, OperationFailed};
pub use migrate::{DnsStatusFn, MigrationManager};
pub use shell::{RemoteShell, ShellCommand, ShellError, SshOptions, SshShell};
pub use store::{DeviceRecord, DeviceStore, FileStore};
pub use types::{
    DeviceIdentity, DnsSettings, DnsStatus, MigrationMethod, MigrationSummary, Route,
    RoutingOptions, Subsystem,
};
