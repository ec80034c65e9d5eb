use super::common::*;
use speaker_migrate::patch::{BOOT_BEGIN, HOOK_BEGIN};
use speaker_migrate::paths::{
    original_of, BOOT_SCRIPT, DHCP_SCRIPTS, PRIORITY_NAMESERVER, RESOLV_CONF, TRUST_BUNDLE,
};
use speaker_migrate::{DnsStatus, MigrationError, MigrationMethod, RoutingOptions};
use std::sync::Arc;

fn migrate_resolv(h: &Harness) -> Result<String, speaker_migrate::OperationFailed> {
    h.manager.migrate_speaker(
        DEVICE,
        None,
        None,
        &RoutingOptions::default(),
        MigrationMethod::Resolv,
    )
}

#[test]
fn test_resolv_requires_dns_enabled() {
    let h = harness(FakeSpeaker::pristine());

    let err = migrate_resolv(&h).unwrap_err();

    assert!(matches!(err.source, MigrationError::DnsDisabled));
    assert!(h.speaker.uploads().is_empty());
    assert!(!h.speaker.has(PRIORITY_NAMESERVER));
}

#[test]
fn test_resolv_requires_port_53() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:5353");

    let err = migrate_resolv(&h).unwrap_err();

    assert!(matches!(err.source, MigrationError::DnsWrongPort { .. }));
    assert!(h.speaker.uploads().is_empty());
}

#[test]
fn test_resolv_checks_live_dns_status() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");
    let Harness {
        speaker,
        manager,
        dir: _dir,
        ..
    } = h;
    let manager = manager.with_dns_status(Arc::new(|| DnsStatus {
        running: false,
        port: 53,
    }));

    let err = manager
        .migrate_speaker(
            DEVICE,
            None,
            None,
            &RoutingOptions::default(),
            MigrationMethod::Resolv,
        )
        .unwrap_err();

    assert!(matches!(err.source, MigrationError::DnsNotRunning(_)));
    assert!(speaker.uploads().is_empty());
}

#[test]
fn test_resolv_migration_installs_hook() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");

    let log = migrate_resolv(&h).expect("resolv migration");

    assert_eq!(
        h.speaker.file(PRIORITY_NAMESERVER).as_deref(),
        Some("nameserver 192.168.1.10\n")
    );

    let boot = h.speaker.file(BOOT_SCRIPT).unwrap();
    assert!(boot.starts_with("#!/bin/sh\n"));
    assert_eq!(boot.matches(BOOT_BEGIN).count(), 1);

    let dhcp = h.speaker.file(DHCP_SCRIPTS[0]).unwrap();
    assert!(dhcp.find(HOOK_BEGIN).unwrap() < dhcp.rfind("exit 0").unwrap());
    assert_eq!(
        h.speaker.file(&original_of(DHCP_SCRIPTS[0])).as_deref(),
        Some(PRISTINE_DHCP)
    );
    assert!(log.contains(&format!("{} not found, skipping", DHCP_SCRIPTS[1])));

    let resolv = h.speaker.file(RESOLV_CONF).unwrap();
    assert_eq!(resolv, "nameserver 192.168.1.10\nnameserver 192.168.1.1\n");
    assert_eq!(
        h.speaker.file(&original_of(RESOLV_CONF)).as_deref(),
        Some(PRISTINE_RESOLV)
    );

    assert!(h.speaker.file(TRUST_BUNDLE).unwrap().contains(LOCAL_CA.trim()));
    assert!(!h.speaker.commands().iter().any(|c| c.contains("reboot")));
}

#[test]
fn test_resolv_migration_is_idempotent() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");

    migrate_resolv(&h).unwrap();
    migrate_resolv(&h).unwrap();

    let dhcp = h.speaker.file(DHCP_SCRIPTS[0]).unwrap();
    assert_eq!(dhcp.matches(HOOK_BEGIN).count(), 1);
    assert_eq!(
        h.speaker.file(&original_of(DHCP_SCRIPTS[0])).as_deref(),
        Some(PRISTINE_DHCP)
    );
    assert_eq!(
        h.speaker.file(BOOT_SCRIPT).unwrap().matches(BOOT_BEGIN).count(),
        1
    );
    assert_eq!(
        h.speaker.file(RESOLV_CONF).as_deref(),
        Some("nameserver 192.168.1.10\nnameserver 192.168.1.1\n")
    );
    assert_eq!(
        h.speaker.file(&original_of(RESOLV_CONF)).as_deref(),
        Some(PRISTINE_RESOLV)
    );
}

#[test]
fn test_resolv_remigration_replaces_previous_nameserver() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");

    migrate_resolv(&h).unwrap();
    h.manager
        .migrate_speaker(
            DEVICE,
            Some("http://192.168.1.20:8000"),
            None,
            &RoutingOptions::default(),
            MigrationMethod::Resolv,
        )
        .unwrap();

    assert_eq!(
        h.speaker.file(PRIORITY_NAMESERVER).as_deref(),
        Some("nameserver 192.168.1.20\n")
    );
    assert_eq!(
        h.speaker.file(RESOLV_CONF).as_deref(),
        Some("nameserver 192.168.1.20\nnameserver 192.168.1.1\n")
    );
    assert_eq!(
        h.speaker.file(&original_of(RESOLV_CONF)).as_deref(),
        Some(PRISTINE_RESOLV)
    );
}

#[test]
fn test_resolv_backup_strips_hook_added_at_boot() {
    let speaker = FakeSpeaker::pristine();
    // The boot hook already patched the script, but no backup was ever taken.
    let (patched, _) = speaker_migrate::patch::patch_dhcp_script(PRISTINE_DHCP);
    speaker.put(DHCP_SCRIPTS[0], &patched);
    let h = harness(speaker);
    enable_dns(&h, "0.0.0.0:53");

    migrate_resolv(&h).unwrap();

    assert_eq!(
        h.speaker.file(&original_of(DHCP_SCRIPTS[0])).as_deref(),
        Some(PRISTINE_DHCP)
    );
    assert_eq!(
        h.speaker
            .file(DHCP_SCRIPTS[0])
            .unwrap()
            .matches(HOOK_BEGIN)
            .count(),
        1
    );
}

#[test]
fn test_resolv_replaces_stored_read_error_in_boot_script() {
    let speaker = FakeSpeaker::pristine();
    speaker.put(
        BOOT_SCRIPT,
        "cat: can't open '/mnt/nv/rc.local': No such file or directory\n",
    );
    let h = harness(speaker);
    enable_dns(&h, "0.0.0.0:53");

    migrate_resolv(&h).unwrap();

    let boot = h.speaker.file(BOOT_SCRIPT).unwrap();
    assert!(!boot.contains("can't open"));
    assert!(boot.starts_with("#!/bin/sh\n"));
}
