use super::common::*;
use speaker_migrate::paths::{original_of, HOSTS_FILE, TRUST_BUNDLE};
use speaker_migrate::trust::CA_LABEL;
use speaker_migrate::{MigrationError, MigrationMethod, RoutingOptions};

fn migrate_hosts(h: &Harness, target: &str) -> Result<String, speaker_migrate::OperationFailed> {
    h.manager.migrate_speaker(
        DEVICE,
        Some(target),
        None,
        &RoutingOptions::default(),
        MigrationMethod::Hosts,
    )
}

#[test]
fn test_hosts_migration_redirects_vendor_domains() {
    let h = harness(FakeSpeaker::pristine());

    migrate_hosts(&h, TARGET).expect("hosts migration");

    let uploaded = h.speaker.uploads_to(HOSTS_FILE);
    assert_eq!(uploaded.len(), 1);
    assert!(uploaded[0].starts_with("127.0.0.1\tlocalhost\n"));
    assert!(uploaded[0].contains("192.168.1.10\tstreaming.bose.com"));

    let commands = h.speaker.commands();
    assert!(commands
        .iter()
        .any(|c| c == &format!("cp -p {HOSTS_FILE} {}", original_of(HOSTS_FILE))));
    assert!(!commands.iter().any(|c| c.contains("reboot")));

    let bundle = h.speaker.file(TRUST_BUNDLE).unwrap();
    assert!(bundle.starts_with(PRISTINE_BUNDLE));
    assert!(bundle.contains(LOCAL_CA.trim()));
    assert_eq!(
        h.speaker.file(&original_of(TRUST_BUNDLE)).as_deref(),
        Some(PRISTINE_BUNDLE)
    );
}

#[test]
fn test_hosts_migration_is_idempotent() {
    let h = harness(FakeSpeaker::pristine());

    migrate_hosts(&h, TARGET).unwrap();
    let first = h.speaker.file(HOSTS_FILE).unwrap();
    migrate_hosts(&h, TARGET).unwrap();

    assert_eq!(h.speaker.file(HOSTS_FILE).unwrap(), first);
    assert_eq!(
        h.speaker.file(&original_of(HOSTS_FILE)).as_deref(),
        Some(PRISTINE_HOSTS)
    );
    let bundle = h.speaker.file(TRUST_BUNDLE).unwrap();
    assert_eq!(bundle.matches(CA_LABEL).count(), 2);
    // Already trusted the second time round: one bundle upload in total.
    assert_eq!(h.speaker.uploads_to(TRUST_BUNDLE).len(), 1);
}

#[test]
fn test_hosts_migration_uses_speaker_resolution() {
    let h = harness(FakeSpeaker::pristine());
    h.speaker.set_ping("soundcork.invalid", "192.168.1.77");

    let log = migrate_hosts(&h, "http://soundcork.invalid:8000").unwrap();

    assert!(log.contains("Speaker resolves soundcork.invalid to 192.168.1.77"));
    assert!(h
        .speaker
        .file(HOSTS_FILE)
        .unwrap()
        .contains("192.168.1.77\tstreaming.bose.com"));
}

#[test]
fn test_hosts_migration_rejects_localhost() {
    let h = harness(FakeSpeaker::pristine());

    let err = migrate_hosts(&h, "http://localhost:8000").unwrap_err();

    assert!(matches!(err.source, MigrationError::InvalidTarget { .. }));
    assert!(h.speaker.uploads_to(HOSTS_FILE).is_empty());
}

#[test]
fn test_hosts_migration_drops_port_from_bare_target() {
    let h = harness(FakeSpeaker::pristine());

    migrate_hosts(&h, "192.168.1.10:8000").unwrap();

    let hosts = h.speaker.file(HOSTS_FILE).unwrap();
    assert!(hosts.contains("192.168.1.10\tstreaming.bose.com"));
    assert!(!hosts.contains(":8000"));
}

#[test]
fn test_hosts_migration_writes_bare_ipv6_address() {
    let h = harness(FakeSpeaker::pristine());

    migrate_hosts(&h, "http://[fd00::10]:8000").unwrap();

    let hosts = h.speaker.file(HOSTS_FILE).unwrap();
    assert!(hosts.contains("fd00::10\tstreaming.bose.com"));
    assert!(!hosts.contains('['));
}

#[test]
fn test_hosts_migration_rejects_unparseable_target() {
    let h = harness(FakeSpeaker::pristine());

    let err = migrate_hosts(&h, "http://no such host:8000").unwrap_err();

    assert!(matches!(err.source, MigrationError::InvalidTarget { .. }));
    assert!(h.speaker.uploads_to(HOSTS_FILE).is_empty());
}

#[test]
fn test_hosts_migration_keeps_unrelated_lines() {
    let speaker = FakeSpeaker::pristine();
    speaker.put(
        HOSTS_FILE,
        "127.0.0.1\tlocalhost\n# lab gear\n\n10.0.0.9 nas.lan\n1.2.3.4 streaming.bose.com\n",
    );
    let h = harness(speaker);

    migrate_hosts(&h, TARGET).unwrap();

    let hosts = h.speaker.file(HOSTS_FILE).unwrap();
    assert!(hosts.contains("# lab gear\n\n10.0.0.9 nas.lan\n"));
    assert!(!hosts.contains("1.2.3.4"));
    assert_eq!(hosts.matches("streaming.bose.com").count(), 1);
}

#[test]
fn test_hosts_migration_fails_without_ca() {
    let h = harness(FakeSpeaker::pristine());
    std::fs::remove_file(h.dir.path().join("ca").join("ca.crt")).unwrap();

    let err = migrate_hosts(&h, TARGET).unwrap_err();

    assert!(matches!(err.source, MigrationError::Authority(_)));
    // Hosts were already rewritten; nothing is rolled back.
    assert_eq!(h.speaker.uploads_to(HOSTS_FILE).len(), 1);
}
