//! Well-known locations on the speaker and the vendor endpoints being redirected.

/// Private cloud-endpoint configuration read by the speaker at boot.
pub const PRIVATE_CONFIG: &str = "/opt/Bose/etc/SoundTouchSdkPrivateCfg.xml";

pub const HOSTS_FILE: &str = "/etc/hosts";

pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// CA bundle used by the speaker for TLS validation.
pub const TRUST_BUNDLE: &str = "/etc/pki/tls/certs/ca-bundle.crt";

/// Nameserver file prepended to resolv.conf by the DHCP hook.
pub const PRIORITY_NAMESERVER: &str = "/mnt/nv/resolv.conf.priority";

/// Boot script that runs from persistent storage on every start.
pub const BOOT_SCRIPT: &str = "/mnt/nv/rc.local";

/// DHCP client scripts that rewrite resolv.conf on lease events.
pub const DHCP_SCRIPTS: [&str; 2] = [
    "/etc/udhcpc.d/50default",
    "/usr/share/udhcpc/default.script",
];

/// Remote-services marker candidates, in priority order. The first one survives reboots.
pub const REMOTE_SERVICES_MARKERS: [&str; 3] = [
    "/mnt/nv/remote_services",
    "/etc/remote_services",
    "/tmp/remote_services",
];

/// Marker location that persists across reboots.
pub const PERSISTENT_REMOTE_SERVICES: &str = REMOTE_SERVICES_MARKERS[0];

/// Scratch location for the CA used by HTTPS self-tests.
pub const SELFTEST_CA: &str = "/tmp/speaker-migrate-ca.pem";

/// Speaker-local endpoint describing the device.
pub const DEVICE_INFO_URL: &str = "http://127.0.0.1:8090/info";

/// Throwaway hostname used by the hosts self-test.
pub const SELFTEST_HOST: &str = "selftest.streaming.bose.com";

/// Vendor domains redirected by the hosts strategy.
pub const VENDOR_DOMAINS: [&str; 8] = [
    "streaming.bose.com",
    "updates.bose.com",
    "worldwide.bose.com",
    "events.api.bosecm.com",
    "content.api.bose.io",
    "bose-prod.apigee.net",
    "bmx.bose.com",
    "voice.api.bose.io",
];

pub const BACKUP_SUFFIX: &str = ".original";

/// Path of the on-device pristine copy for `path`.
pub fn original_of(path: &str) -> String {
    format!("{path}{BACKUP_SUFFIX}")
}
