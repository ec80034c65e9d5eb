use super::common::*;
use speaker_migrate::paths::{
    original_of, BOOT_SCRIPT, DHCP_SCRIPTS, HOSTS_FILE, PERSISTENT_REMOTE_SERVICES,
    PRIORITY_NAMESERVER, PRIVATE_CONFIG, RESOLV_CONF, TRUST_BUNDLE,
};
use speaker_migrate::{MigrationError, MigrationMethod, RoutingOptions};

fn migrate(h: &Harness, method: MigrationMethod) {
    h.manager
        .migrate_speaker(DEVICE, None, None, &RoutingOptions::default(), method)
        .unwrap_or_else(|e| panic!("{method} migration failed: {}\n{}", e, e.log));
}

#[test]
fn test_revert_without_backup_fails_and_uploads_nothing() {
    let h = harness(FakeSpeaker::pristine());

    let err = h.manager.revert_migration(DEVICE).unwrap_err();

    assert!(matches!(err.source, MigrationError::NoBackup { .. }));
    assert!(err.to_string().to_lowercase().contains("backup"));
    assert!(h.speaker.uploads().is_empty());
    assert!(!h.speaker.commands().iter().any(|c| c.starts_with("cp")));
}

#[test]
fn test_revert_of_unreachable_speaker_reports_connection() {
    let h = harness(FakeSpeaker::pristine());
    migrate(&h, MigrationMethod::Xml);
    h.speaker.set_unreachable();

    let err = h.manager.revert_migration(DEVICE).unwrap_err();

    assert!(matches!(err.source, MigrationError::Unreachable { .. }));
    assert!(!err.log.contains("original copy"));
}

#[test]
fn test_revert_restores_config_bytes() {
    let h = harness(FakeSpeaker::pristine());
    migrate(&h, MigrationMethod::Xml);
    assert_ne!(h.speaker.file(PRIVATE_CONFIG).as_deref(), Some(PRISTINE_CONFIG));

    let log = h.manager.revert_migration(DEVICE).expect("revert");

    assert_eq!(h.speaker.file(PRIVATE_CONFIG).as_deref(), Some(PRISTINE_CONFIG));
    assert!(log.contains(&format!("No backup of {HOSTS_FILE}, leaving it as is")));
    // The marker stays and nothing reboots.
    assert!(h.speaker.has(PERSISTENT_REMOTE_SERVICES));
    assert!(!h.speaker.commands().iter().any(|c| c.contains("reboot")));
}

#[test]
fn test_revert_undoes_every_method() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");
    migrate(&h, MigrationMethod::Xml);
    migrate(&h, MigrationMethod::Hosts);
    migrate(&h, MigrationMethod::Resolv);

    h.manager.revert_migration(DEVICE).expect("revert");

    assert_eq!(h.speaker.file(PRIVATE_CONFIG).as_deref(), Some(PRISTINE_CONFIG));
    assert_eq!(h.speaker.file(HOSTS_FILE).as_deref(), Some(PRISTINE_HOSTS));
    assert_eq!(h.speaker.file(RESOLV_CONF).as_deref(), Some(PRISTINE_RESOLV));
    assert_eq!(h.speaker.file(DHCP_SCRIPTS[0]).as_deref(), Some(PRISTINE_DHCP));
    assert_eq!(h.speaker.file(TRUST_BUNDLE).as_deref(), Some(PRISTINE_BUNDLE));
    assert!(!h.speaker.has(PRIORITY_NAMESERVER));
    assert!(!h.speaker.has(BOOT_SCRIPT));

    let commands = h.speaker.commands();
    let chattr = commands
        .iter()
        .rposition(|c| c == &format!("chattr -i {RESOLV_CONF}"))
        .unwrap();
    let restore = commands
        .iter()
        .rposition(|c| c == &format!("cp -p {} {RESOLV_CONF}", original_of(RESOLV_CONF)))
        .unwrap();
    assert!(chattr < restore);
}

#[test]
fn test_revert_keeps_existing_boot_script_content() {
    let speaker = FakeSpeaker::pristine();
    speaker.put(BOOT_SCRIPT, "#!/bin/sh\n/opt/start-things &\n");
    let h = harness(speaker);
    enable_dns(&h, "0.0.0.0:53");
    migrate(&h, MigrationMethod::Xml);
    migrate(&h, MigrationMethod::Resolv);

    h.manager.revert_migration(DEVICE).unwrap();

    assert_eq!(
        h.speaker.file(BOOT_SCRIPT).as_deref(),
        Some("#!/bin/sh\n/opt/start-things &\n")
    );
}

#[test]
fn test_revert_secondary_failures_are_warnings() {
    let h = harness(FakeSpeaker::pristine());
    migrate(&h, MigrationMethod::Xml);
    migrate(&h, MigrationMethod::Hosts);
    h.speaker.lock_path(HOSTS_FILE);

    let log = h
        .manager
        .revert_migration(DEVICE)
        .expect("secondary failures do not fail the revert");

    assert!(log.contains(&format!("WARNING: Could not restore {HOSTS_FILE}")));
    assert_eq!(h.speaker.file(PRIVATE_CONFIG).as_deref(), Some(PRISTINE_CONFIG));
}
