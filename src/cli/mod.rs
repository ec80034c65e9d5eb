use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::{
    FileAuthority, FileStore, MigrationManager, MigrationMethod, OperationFailed, RoutingOptions,
    SshOptions, SshShell, Subsystem,
};

mod dns;
mod migrate;
mod selftest;
mod services;
mod summary;
mod trust;

#[derive(Parser)]
#[command(
    name = "speaker-migrate",
    version,
    about = "Redirect speakers from the vendor cloud to a local substitute service",
    long_about = "Reconfigures speakers over SSH so their cloud traffic reaches a local service, \
                  and can preview, test and revert that change.",
    after_help = "Examples:\n  speaker-migrate summary 192.168.1.40 --target http://192.168.1.10:8000\n  speaker-migrate migrate 192.168.1.40 --method hosts\n  speaker-migrate revert 192.168.1.40\n\nNothing reboots the speaker except 'speaker-migrate reboot'."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
pub(crate) struct GlobalOpts {
    /// Base URL of the local substitute service
    #[arg(
        long,
        env = "SPEAKER_MIGRATE_BASE_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub(crate) base_url: String,

    /// Directory holding devices.toml, settings.toml and local backups
    #[arg(
        long,
        env = "SPEAKER_MIGRATE_DATA_DIR",
        default_value = "./data",
        global = true
    )]
    pub(crate) data_dir: PathBuf,

    /// SSH user on the speaker
    #[arg(long, env = "SPEAKER_MIGRATE_SSH_USER", default_value = "root", global = true)]
    pub(crate) ssh_user: String,

    /// SSH port on the speaker
    #[arg(long, env = "SPEAKER_MIGRATE_SSH_PORT", default_value_t = 22, global = true)]
    pub(crate) ssh_port: u16,

    /// SSH connect timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub(crate) ssh_timeout: u64,

    /// CA certificate (PEM) the speaker should trust [default: <data-dir>/ca/ca.crt]
    #[arg(long, env = "SPEAKER_MIGRATE_CA_CERT", global = true)]
    pub(crate) ca_cert: Option<PathBuf>,

    /// CA private key [default: <data-dir>/ca/ca.key]
    #[arg(long, env = "SPEAKER_MIGRATE_CA_KEY", global = true)]
    pub(crate) ca_key: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
}

/// Where the speaker should be pointed.
#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Target service URL (defaults to --base-url)
    #[arg(long)]
    pub(crate) target: Option<String>,

    /// Proxy URL for upstream passthrough (defaults to the target)
    #[arg(long)]
    pub(crate) proxy: Option<String>,

    /// Keep a subsystem talking to its current upstream through the proxy (repeatable)
    #[arg(long, value_enum)]
    pub(crate) upstream: Vec<Subsystem>,
}

impl TargetArgs {
    pub(crate) fn routing(&self) -> RoutingOptions {
        RoutingOptions::upstream(&self.upstream)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Toggle {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum TrustAction {
    /// Add the local CA to the speaker's bundle
    Add,
    /// Remove the local CA from the speaker's bundle
    Remove,
    /// Report whether the speaker trusts the local CA
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum TestKind {
    /// Plain HTTP reachability of the target
    Connection,
    /// HTTP and HTTPS through a temporary hosts entry
    Hosts,
    /// Raw DNS query against the local DNS service
    Dns,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a migration would change (read-only)
    Summary {
        /// Speaker address
        device: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Show a diff of the current and planned configuration
        #[arg(long)]
        diff: bool,
    },

    /// Redirect the speaker to the target service
    Migrate {
        /// Speaker address
        device: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Redirection method
        #[arg(short, long, value_enum, default_value_t = MigrationMethod::Xml)]
        method: MigrationMethod,
    },

    /// Restore the speaker's original configuration from on-device backups
    Revert {
        /// Speaker address
        device: String,
    },

    /// Run a connectivity self-test from the speaker
    Test {
        /// Speaker address
        device: String,

        /// Which test to run
        #[arg(value_enum)]
        kind: TestKind,

        /// Target service URL (defaults to --base-url)
        #[arg(long)]
        target: Option<String>,
    },

    /// Enable or disable the remote-services marker
    Services {
        /// Speaker address
        device: String,

        #[arg(value_enum)]
        action: Toggle,
    },

    /// Manage the local CA in the speaker's trust bundle
    Trust {
        /// Speaker address
        device: String,

        #[arg(value_enum)]
        action: TrustAction,
    },

    /// Reboot the speaker
    Reboot {
        /// Speaker address
        device: String,
    },

    /// Enable or disable local DNS redirection in settings
    Dns {
        #[arg(value_enum)]
        action: Toggle,

        /// Bind address for the DNS service
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn build_store(global: &GlobalOpts) -> FileStore {
    FileStore::new(&global.data_dir)
}

pub(crate) fn build_manager(global: &GlobalOpts) -> MigrationManager {
    let ca_dir = global.data_dir.join("ca");
    let authority = FileAuthority::new(
        global
            .ca_cert
            .clone()
            .unwrap_or_else(|| ca_dir.join("ca.crt")),
        global.ca_key.clone().unwrap_or_else(|| ca_dir.join("ca.key")),
    );
    let shell = SshShell::new(SshOptions {
        user: global.ssh_user.clone(),
        port: global.ssh_port,
        connect_timeout: Duration::from_secs(global.ssh_timeout),
        ..Default::default()
    });

    MigrationManager::new(
        Arc::new(shell),
        Arc::new(build_store(global)),
        Arc::new(authority),
        global.base_url.clone(),
    )
}

/// Print an operation log. On failure the partial log goes to stderr.
pub(crate) fn report(result: Result<String, OperationFailed>) -> Result<()> {
    match result {
        Ok(log) => {
            println!("{log}");
            Ok(())
        }
        Err(failed) => {
            if !failed.log.is_empty() {
                eprintln!("{}", failed.log);
            }
            Err(failed.source.into())
        }
    }
}

pub fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Summary {
            device,
            target,
            json,
            diff,
        } => summary::run_summary(&cli.global, &device, &target, json, diff),
        Commands::Migrate {
            device,
            target,
            method,
        } => migrate::run_migrate(&cli.global, &device, &target, method),
        Commands::Revert { device } => migrate::run_revert(&cli.global, &device),
        Commands::Test {
            device,
            kind,
            target,
        } => selftest::run_test(&cli.global, &device, kind, target.as_deref()),
        Commands::Services { device, action } => {
            services::run_services(&cli.global, &device, action)
        }
        Commands::Trust { device, action } => trust::run_trust(&cli.global, &device, action),
        Commands::Reboot { device } => migrate::run_reboot(&cli.global, &device),
        Commands::Dns { action, bind } => dns::run_dns(&cli.global, action, bind),
    }
}
