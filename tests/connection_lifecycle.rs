//! Integration tests for outbound connection lifecycle.
//!
//! Connecting, registering, server hangups and gateway shutdown.

mod common;

use common::{FakeNetwork, TestGateway};
use hatcogd::network::ConnectionState;
use hatcogd::{ConnectionError, ManagerError};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_registration_burst() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::with_registration("hatcog", "Hatcog User");

    let mut session = gateway.connect(&network).await.expect("Failed to connect");

    assert_eq!(
        session.recv_line().await.unwrap(),
        "USER hatcog localhost localhost :Hatcog User"
    );
    assert_eq!(session.recv_line().await.unwrap(), "NICK hatcog");
    session
        .expect_silence(Duration::from_millis(100))
        .await
        .expect("Nothing else should be sent after registering");
}

#[tokio::test]
async fn test_no_registration_without_identity() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::new();

    let mut session = gateway.connect(&network).await.expect("Failed to connect");
    session
        .expect_silence(Duration::from_millis(100))
        .await
        .expect("Unregistered connection should stay quiet");
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::new();

    let _session = gateway.connect(&network).await.expect("Failed to connect");
    gateway
        .manager
        .connect(network.address())
        .await
        .expect("Second connect should succeed");

    network
        .expect_no_dial(Duration::from_millis(200))
        .await
        .expect("Second connect must reuse the first connection");
    assert_eq!(gateway.manager.addresses(), vec![network.address().to_string()]);
}

#[tokio::test]
async fn test_concurrent_connects_share_one_dial() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::new();

    let (first, second, session) = tokio::join!(
        gateway.manager.connect(network.address()),
        gateway.manager.connect(network.address()),
        network.accept()
    );
    first.expect("First connect failed");
    second.expect("Second connect failed");
    let _session = session.expect("Accept failed");

    network
        .expect_no_dial(Duration::from_millis(200))
        .await
        .expect("Concurrent connects must share one dial");
}

#[tokio::test]
async fn test_networks_are_independent() {
    let first = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let second = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::new();

    let first_session = gateway.connect(&first).await.expect("Failed to connect");
    let mut second_session = gateway.connect(&second).await.expect("Failed to connect");

    // Losing one network leaves the other usable.
    first_session.close().await;
    let conn = gateway.manager.get(first.address()).expect("Connection missing");
    timeout(Duration::from_secs(5), conn.closed())
        .await
        .expect("First connection should close");

    gateway
        .manager
        .send_message(second.address(), "#chan", "still here")
        .await
        .expect("Second network should be unaffected");
    assert_eq!(
        second_session.recv_line().await.unwrap(),
        "PRIVMSG #chan :still here"
    );
}

#[tokio::test]
async fn test_server_hangup_closes_connection() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let mut gateway = TestGateway::new();

    let session = gateway.connect(&network).await.expect("Failed to connect");
    let conn = gateway.manager.get(network.address()).expect("Connection missing");
    assert_eq!(conn.state(), ConnectionState::Running);

    session.close().await;
    timeout(Duration::from_secs(5), conn.closed())
        .await
        .expect("Connection should notice EOF");
    gateway
        .expect_no_line(Duration::from_millis(100))
        .await
        .expect("EOF must not produce a line");

    let err = gateway
        .manager
        .send_message(network.address(), "#chan", "hello?")
        .await
        .expect_err("Send on a closed connection should fail");
    assert!(matches!(
        err,
        ManagerError::Connection(ConnectionError::Closed)
    ));
}

#[tokio::test]
async fn test_dial_failure_is_reported() {
    // Grab a free port, then stop listening on it.
    let address = {
        let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
        network.address().to_string()
    };
    let gateway = TestGateway::new();

    let err = gateway
        .manager
        .connect(&address)
        .await
        .expect_err("Nothing is listening");
    assert!(matches!(
        err,
        ManagerError::Connection(ConnectionError::Dial { .. })
    ));
    assert!(!gateway.manager.is_connected(&address));
}

#[tokio::test]
async fn test_invalid_address() {
    let gateway = TestGateway::new();
    let err = gateway
        .manager
        .connect("no-port-here")
        .await
        .expect_err("Address without a port");
    assert!(matches!(
        err,
        ManagerError::Connection(ConnectionError::InvalidAddress(_))
    ));
}

#[tokio::test]
async fn test_unknown_network() {
    let gateway = TestGateway::new();
    let err = gateway
        .manager
        .send_message("irc.nowhere.test:6667", "#chan", "hi")
        .await
        .expect_err("Never connected");
    assert!(matches!(err, ManagerError::UnknownNetwork(_)));
}

#[tokio::test]
async fn test_shutdown_closes_everything() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::new();

    let mut session = gateway.connect(&network).await.expect("Failed to connect");
    let conn = gateway.manager.get(network.address()).expect("Connection missing");

    timeout(Duration::from_secs(5), gateway.manager.shutdown())
        .await
        .expect("Shutdown should finish");

    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(gateway.manager.addresses().is_empty());
    session.expect_eof().await.expect("Socket should be closed");

    // Second shutdown is a no-op.
    timeout(Duration::from_secs(5), gateway.manager.shutdown())
        .await
        .expect("Second shutdown should finish");

    let err = gateway
        .manager
        .send_message(network.address(), "#chan", "hi")
        .await
        .expect_err("Map is empty after shutdown");
    assert!(matches!(err, ManagerError::UnknownNetwork(_)));
}

#[tokio::test]
async fn test_shutdown_with_full_line_channel() {
    let network = FakeNetwork::bind().await.expect("Failed to bind fake network");
    let gateway = TestGateway::with_capacity(1);

    let mut session = gateway.connect(&network).await.expect("Failed to connect");
    for n in 0..3 {
        session
            .send_line(&format!(":srv NOTICE * :line {n}"))
            .await
            .unwrap();
    }
    // Let the read task fill the channel and block on the next push.
    tokio::time::sleep(Duration::from_millis(100)).await;

    timeout(Duration::from_secs(5), gateway.manager.shutdown())
        .await
        .expect("Shutdown must not hang on a blocked push");
}
