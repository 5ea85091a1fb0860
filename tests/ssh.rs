// ABOUTME: Integration tests for the SSH session layer.
// ABOUTME: Covers key loading and connection failures against local sockets.

mod support;

use skiff::config::RequestInput;
use skiff::deploy::connectivity;
use skiff::error::ErrorKind;
use skiff::remote::SshConnector;
use skiff::ssh::{Error, Session, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;
use support::quiet;

fn fixture_key() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/id_ed25519")
}

/// A localhost port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn missing_key_fails_before_connecting() {
    let config = SessionConfig::new("127.0.0.1", "deploy", "/nonexistent/skiff/id_ed25519")
        .port(closed_port());

    let err = Session::connect(config).await.unwrap_err();
    assert!(matches!(err, Error::KeyLoadFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn garbage_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("id_ed25519");
    std::fs::write(&key, "not a key\n").unwrap();

    let err = Session::connect(SessionConfig::new("127.0.0.1", "deploy", &key))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::KeyLoadFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn refused_port_is_a_connection_error() {
    let config = SessionConfig::new("127.0.0.1", "deploy", fixture_key())
        .port(closed_port())
        .connect_timeout(Duration::from_secs(5));

    let err = Session::connect(config).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        // Accept and never speak.
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let config = SessionConfig::new("127.0.0.1", "deploy", fixture_key())
        .port(port)
        .connect_timeout(Duration::from_millis(300));

    let err = Session::connect(config).await.unwrap_err();
    assert!(matches!(err, Error::ConnectTimeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn connectivity_check_maps_ssh_failures() {
    let target = RequestInput {
        user: Some("deploy".to_string()),
        host: Some("127.0.0.1".to_string()),
        ssh_port: Some(closed_port()),
        key: Some(fixture_key()),
        connect_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
    .into_target()
    .unwrap();

    let err = connectivity::check(&SshConnector, &target, &quiet())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(err.to_string().contains("deploy@127.0.0.1"));
}
