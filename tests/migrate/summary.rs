use super::common::*;
use speaker_migrate::paths::{PRIORITY_NAMESERVER, PRIVATE_CONFIG};
use speaker_migrate::{is_migrated, MigrationMethod, RoutingOptions, Subsystem};
use std::fs;

const INFO: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<info deviceID="A81B6A536A98">
  <name>Kitchen</name>
  <type>SoundTouch 10</type>
  <components>
    <component>
      <softwareVersion>27.0.6</softwareVersion>
      <serialNumber>I6332527703739342000020</serialNumber>
    </component>
  </components>
</info>"#;

fn summarize(h: &Harness) -> speaker_migrate::MigrationSummary {
    h.manager
        .migration_summary(DEVICE, None, None, &RoutingOptions::default())
        .expect("summary")
}

#[test]
fn test_summary_of_pristine_speaker() {
    let h = harness(FakeSpeaker::pristine());

    let summary = summarize(&h);

    assert!(summary.ssh_success);
    assert_eq!(summary.target_url, TARGET);
    assert_eq!(summary.proxy_url, TARGET);
    assert_eq!(summary.https_preview_url, "https://192.168.1.10/");
    assert_eq!(summary.current_config_text.as_deref(), Some(PRISTINE_CONFIG));
    assert_eq!(
        summary.current_config.as_ref().unwrap().marge_server_url,
        "https://streaming.bose.com"
    );
    assert_eq!(
        summary.planned_config.url(Subsystem::Marge),
        "http://192.168.1.10:8000/marge"
    );
    assert!(summary.planned_config_text.contains("<margeServerUrl>"));
    assert!(summary
        .planned_hosts
        .contains("192.168.1.10\tstreaming.bose.com"));
    assert!(!summary.remote_services_enabled);
    assert!(!summary.ca_trusted);
    assert!(!summary.dns_hook_installed);
    assert!(!summary.already_migrated);
    assert!(!is_migrated(&summary));
}

#[test]
fn test_summary_is_read_only() {
    let h = harness(FakeSpeaker::pristine());

    summarize(&h);

    assert!(h.speaker.uploads().is_empty());
    let mutating = ["cp", "rm", "touch", "mount", "chattr", "chmod", "reboot"];
    for command in h.speaker.commands() {
        let program = command.split_whitespace().next().unwrap_or_default();
        assert!(!mutating.contains(&program), "summary ran {command}");
    }
}

#[test]
fn test_summary_of_unreachable_speaker_is_soft() {
    let speaker = FakeSpeaker::pristine();
    speaker.set_unreachable();
    let h = harness(speaker);

    let summary = summarize(&h);

    assert!(!summary.ssh_success);
    assert!(summary.ssh_error.unwrap().contains("Connection timed out"));
    assert!(summary.current_config.is_none());
    assert_eq!(
        summary.planned_config.url(Subsystem::Stats),
        "http://192.168.1.10:8000"
    );
    assert!(!summary.already_migrated);
}

#[test]
fn test_summary_merges_stored_and_live_identity() {
    let h = harness(FakeSpeaker::pristine());
    fs::write(
        h.dir.path().join("devices.toml"),
        format!(
            "[[device]]\naddress = \"{DEVICE}\"\nname = \"Old name\"\naccount = \"3230304\"\n"
        ),
    )
    .unwrap();
    h.speaker.set_device_info(INFO);

    let summary = summarize(&h);

    assert_eq!(summary.identity.name.as_deref(), Some("Kitchen"));
    assert_eq!(summary.identity.account.as_deref(), Some("3230304"));
    assert_eq!(summary.identity.firmware.as_deref(), Some("27.0.6"));
}

#[test]
fn test_summary_wraps_upstream_subsystems() {
    let h = harness(FakeSpeaker::pristine());
    let routing = RoutingOptions::upstream(&[Subsystem::Bmx]);

    let summary = h
        .manager
        .migration_summary(DEVICE, None, Some("http://192.168.1.10:9000"), &routing)
        .unwrap();

    assert_eq!(
        summary.planned_config.bmx_registry_url,
        "http://192.168.1.10:9000/proxy/https://content.api.bose.io/bmx/registry/v1/services"
    );
    assert_eq!(
        summary.planned_config.marge_server_url,
        "http://192.168.1.10:8000/marge"
    );
}

#[test]
fn test_detects_each_migration_method() {
    for method in [MigrationMethod::Xml, MigrationMethod::Hosts] {
        let h = harness(FakeSpeaker::pristine());
        h.manager
            .migrate_speaker(DEVICE, None, None, &RoutingOptions::default(), method)
            .unwrap();
        let summary = summarize(&h);
        assert!(summary.already_migrated, "{method} not detected");
    }

    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");
    h.manager
        .migrate_speaker(
            DEVICE,
            None,
            None,
            &RoutingOptions::default(),
            MigrationMethod::Resolv,
        )
        .unwrap();
    let summary = summarize(&h);
    assert!(summary.dns_hook_installed);
    assert!(summary.ca_trusted);
    assert!(summary.already_migrated);
}

#[test]
fn test_dns_hook_without_trust_is_not_migrated() {
    let speaker = FakeSpeaker::pristine();
    speaker.put(PRIORITY_NAMESERVER, "nameserver 192.168.1.10\n");
    let h = harness(speaker);

    let summary = summarize(&h);

    assert!(summary.dns_hook_installed);
    assert!(!summary.already_migrated);
}

#[test]
fn test_unparseable_config_is_reported_but_not_fatal() {
    let speaker = FakeSpeaker::pristine();
    speaker.put(PRIVATE_CONFIG, "not xml at all");
    let h = harness(speaker);

    let summary = summarize(&h);

    assert!(summary.ssh_success);
    assert!(summary.current_config.is_none());
    assert_eq!(summary.current_config_text.as_deref(), Some("not xml at all"));
}
