use super::common::*;
use speaker_migrate::paths::{HOSTS_FILE, SELFTEST_CA, SELFTEST_HOST};
use speaker_migrate::MigrationError;

#[test]
fn test_connection_reports_status_code() {
    let h = harness(FakeSpeaker::pristine());

    let log = h.manager.test_connection(DEVICE, None).unwrap();

    assert!(log.contains("answered with status 200"));
    assert!(h.speaker.uploads().is_empty());
}

#[test]
fn test_connection_without_response_fails() {
    let h = harness(FakeSpeaker::pristine());
    h.speaker.set_http_code("000");

    let err = h.manager.test_connection(DEVICE, None).unwrap_err();

    assert!(matches!(err.source, MigrationError::RemoteCommand { .. }));
    assert!(err.log.contains("ERROR:"));
}

#[test]
fn test_hosts_redirection_cleans_up() {
    let h = harness(FakeSpeaker::pristine());

    let log = h.manager.test_hosts_redirection(DEVICE, None).unwrap();

    assert!(log.contains(&format!("Added temporary entry 192.168.1.10 {SELFTEST_HOST}")));
    assert!(log.contains("verified against local CA"));
    assert_eq!(h.speaker.file(HOSTS_FILE).as_deref(), Some(PRISTINE_HOSTS));
    assert!(!h.speaker.has(SELFTEST_CA));
    assert_eq!(h.speaker.uploads_to(SELFTEST_CA), vec![LOCAL_CA.to_string()]);

    let commands = h.speaker.commands();
    assert!(commands.iter().any(|c| c.contains(&format!(
        "http://{SELFTEST_HOST}:8000/"
    ))));
    assert!(commands
        .iter()
        .any(|c| c.contains(&format!("--cacert {SELFTEST_CA} https://{SELFTEST_HOST}/"))));
}

#[test]
fn test_hosts_redirection_cleans_up_after_failed_request() {
    let h = harness(FakeSpeaker::pristine());
    h.speaker.set_http_code("000");

    let err = h.manager.test_hosts_redirection(DEVICE, None).unwrap_err();

    assert!(err.log.contains(&format!("Removed temporary entry for {SELFTEST_HOST}")));
    assert_eq!(h.speaker.file(HOSTS_FILE).as_deref(), Some(PRISTINE_HOSTS));
}

#[test]
fn test_dns_redirection_parses_answer() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:53");
    h.speaker.set_dns_answer([192, 168, 1, 10]);

    let log = h.manager.test_dns_redirection(DEVICE, None).unwrap();

    assert!(log.contains("DNS answered streaming.bose.com -> 192.168.1.10"));
    assert!(!log.contains("WARNING"));
    let commands = h.speaker.commands();
    assert!(commands
        .iter()
        .any(|c| c.contains("| nc -u -w 2 192.168.1.10 53 | od -An -tx1 -v")));
}

#[test]
fn test_dns_redirection_warns_on_foreign_answer() {
    let h = harness(FakeSpeaker::pristine());
    enable_dns(&h, "0.0.0.0:5353");
    h.speaker.set_dns_answer([1, 2, 3, 4]);

    let log = h.manager.test_dns_redirection(DEVICE, None).unwrap();

    assert!(log.contains("via 192.168.1.10:5353"));
    assert!(log.contains("WARNING: Answer does not include the service address 192.168.1.10"));
}
