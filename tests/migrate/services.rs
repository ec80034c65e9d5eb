use super::common::*;
use speaker_migrate::paths::REMOTE_SERVICES_MARKERS;
use speaker_migrate::MigrationError;

#[test]
fn test_ensure_remote_services_prefers_persistent_location() {
    let h = harness(FakeSpeaker::pristine());

    let location = h.manager.ensure_remote_services(DEVICE).unwrap();

    assert_eq!(location, REMOTE_SERVICES_MARKERS[0]);
    assert_eq!(
        h.speaker.commands(),
        vec![format!("sudo touch {}", REMOTE_SERVICES_MARKERS[0])]
    );
}

#[test]
fn test_ensure_remote_services_falls_through_locations() {
    let speaker = FakeSpeaker::pristine();
    speaker.lock_path(REMOTE_SERVICES_MARKERS[0]);
    speaker.lock_path(REMOTE_SERVICES_MARKERS[1]);
    let h = harness(speaker);

    let location = h.manager.ensure_remote_services(DEVICE).unwrap();

    assert_eq!(location, REMOTE_SERVICES_MARKERS[2]);
    let commands = h.speaker.commands();
    // Privileged then plain for each refused location, then success.
    assert_eq!(commands.len(), 5);
    assert_eq!(commands[1], format!("touch {}", REMOTE_SERVICES_MARKERS[0]));
}

#[test]
fn test_ensure_remote_services_fails_when_every_location_refuses() {
    let speaker = FakeSpeaker::pristine();
    for path in REMOTE_SERVICES_MARKERS {
        speaker.lock_path(path);
    }
    let h = harness(speaker);

    let err = h.manager.ensure_remote_services(DEVICE).unwrap_err();

    assert!(matches!(err, MigrationError::RemoteServicesUnavailable));
    assert_eq!(h.speaker.commands().len(), 6);
}

#[test]
fn test_ensure_remote_services_reports_unreachable() {
    let speaker = FakeSpeaker::pristine();
    speaker.set_unreachable();
    let h = harness(speaker);

    let err = h.manager.ensure_remote_services(DEVICE).unwrap_err();

    assert!(matches!(err, MigrationError::Unreachable { .. }));
}

#[test]
fn test_remove_remote_services_clears_all_locations() {
    let speaker = FakeSpeaker::pristine();
    for path in REMOTE_SERVICES_MARKERS {
        speaker.put(path, "");
    }
    speaker.lock_path(REMOTE_SERVICES_MARKERS[1]);
    let h = harness(speaker);

    let cleared = h.manager.remove_remote_services(DEVICE).unwrap();

    assert_eq!(
        cleared,
        vec![
            REMOTE_SERVICES_MARKERS[0].to_string(),
            REMOTE_SERVICES_MARKERS[2].to_string()
        ]
    );
    assert!(!h.speaker.has(REMOTE_SERVICES_MARKERS[0]));
    assert!(h.speaker.has(REMOTE_SERVICES_MARKERS[1]));
}
