// ABOUTME: Tests for the --cleanup teardown against scripted hosts.
// ABOUTME: Teardown succeeds on empty hosts and turns step failures into warnings.

mod support;

use skiff::commands;
use skiff::diagnostics::WarningKind;
use skiff::error::ErrorKind;
use support::{ConnectBehavior, FakeConnector, FakeRemote, failed, ok, quiet, valid_input};

#[tokio::test]
async fn cleanup_on_empty_host_succeeds_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let target = valid_input(dir.path()).into_target().unwrap();
    let connector = FakeConnector::new(FakeRemote::empty());

    let diag = commands::cleanup(&target, &connector, &mut quiet())
        .await
        .unwrap();

    assert!(!diag.has_warnings(), "got {:?}", diag.warnings());
    let remote = &connector.remote;
    assert!(remote.ran("sudo docker rm -f skiff-app"));
    assert!(remote.ran("sudo docker system prune -f"));
    assert!(remote.ran(
        "sudo rm -f /etc/nginx/sites-enabled/skiff-app /etc/nginx/sites-available/skiff-app"
    ));
    assert!(remote.ran("sudo systemctl reload nginx"));
    assert!(!remote.ran("compose"));
    assert_eq!(connector.disconnects(), 1);
}

#[tokio::test]
async fn compose_release_is_brought_down_first() {
    let dir = tempfile::tempdir().unwrap();
    let target = valid_input(dir.path()).into_target().unwrap();
    let remote = FakeRemote::empty();
    remote.respond("ls -1A", ok("compose.yaml\nsrc\n"));
    let connector = FakeConnector::new(remote);

    commands::cleanup(&target, &connector, &mut quiet())
        .await
        .unwrap();

    let remote = &connector.remote;
    let down = remote
        .position("sudo docker compose -p skiff-app -f 'compose.yaml' down --remove-orphans")
        .unwrap();
    let rm = remote.position("sudo docker rm -f skiff-app").unwrap();
    assert!(down < rm);
}

#[tokio::test]
async fn failing_step_becomes_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let target = valid_input(dir.path()).into_target().unwrap();
    let remote = FakeRemote::empty();
    remote.respond(
        "systemctl reload nginx",
        failed(5, "Failed to reload nginx.service: Unit nginx.service not found."),
    );
    let connector = FakeConnector::new(remote);

    let diag = commands::cleanup(&target, &connector, &mut quiet())
        .await
        .unwrap();

    let warnings: Vec<_> = diag.of_kind(WarningKind::Cleanup).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("nginx.service not found"));
}

#[tokio::test]
async fn unreachable_host_fails_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let target = valid_input(dir.path()).into_target().unwrap();
    let connector = FakeConnector::with_behavior(FakeRemote::empty(), ConnectBehavior::Refuse);

    let err = commands::cleanup(&target, &connector, &mut quiet())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(connector.remote.commands().is_empty());
}
