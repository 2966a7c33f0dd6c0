//! Gateway harness.

use hatcog_proto::Line;
use hatcogd::network::{ConnectOptions, ConnectionManager, ConnectionSettings, Registration};
use hatcogd::network::line_channel;
use hatcogd::raw_log::MemoryRawLog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::server::{FakeNetwork, FakeSession};

/// Settings with no greeting delay and a short read deadline.
pub fn test_settings() -> ConnectionSettings {
    ConnectionSettings {
        client_version: "hatcogd test".to_string(),
        pong_token: "hatcogd".to_string(),
        read_timeout: Duration::from_millis(50),
        greeting_delay: Duration::ZERO,
        connect_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(10),
    }
}

pub struct TestGateway {
    pub manager: ConnectionManager,
    pub lines: mpsc::Receiver<Line>,
    pub raw_log: Arc<MemoryRawLog>,
}

impl TestGateway {
    /// A gateway that does not register on connect.
    pub fn new() -> Self {
        Self::build(ConnectOptions::default(), test_settings(), 64)
    }

    /// A gateway with custom connection settings.
    pub fn with_settings(settings: ConnectionSettings) -> Self {
        Self::build(ConnectOptions::default(), settings, 64)
    }

    /// A gateway that registers as `nick` on connect.
    pub fn with_registration(nick: &str, name: &str) -> Self {
        let options = ConnectOptions {
            registration: Some(Registration {
                nick: nick.to_string(),
                name: name.to_string(),
            }),
            ..ConnectOptions::default()
        };
        Self::build(options, test_settings(), 64)
    }

    /// A gateway whose line channel holds only `capacity` lines.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(ConnectOptions::default(), test_settings(), capacity)
    }

    fn build(options: ConnectOptions, settings: ConnectionSettings, capacity: usize) -> Self {
        let (tx, lines) = line_channel(capacity);
        let raw_log = Arc::new(MemoryRawLog::new());
        let manager = ConnectionManager::new(tx, settings, raw_log.clone())
            .with_default_options(options);
        Self {
            manager,
            lines,
            raw_log,
        }
    }

    /// Connect to `network` and return the server side of the connection.
    pub async fn connect(&self, network: &FakeNetwork) -> anyhow::Result<FakeSession> {
        let (connected, session) = tokio::join!(
            self.manager.connect(network.address()),
            network.accept()
        );
        connected?;
        session
    }

    /// Connect to `network` with explicit options.
    pub async fn connect_with(
        &self,
        network: &FakeNetwork,
        options: ConnectOptions,
    ) -> anyhow::Result<FakeSession> {
        let (connected, session) = tokio::join!(
            self.manager.connect_with(network.address(), options),
            network.accept()
        );
        connected?;
        session
    }

    /// Next forwarded line.
    pub async fn next_line(&mut self) -> anyhow::Result<Line> {
        timeout(Duration::from_secs(5), self.lines.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("line channel closed"))
    }

    /// Assert nothing is forwarded within `dur`.
    pub async fn expect_no_line(&mut self, dur: Duration) -> anyhow::Result<()> {
        match timeout(dur, self.lines.recv()).await {
            Err(_) | Ok(None) => Ok(()),
            Ok(Some(line)) => anyhow::bail!("unexpected forwarded line: {:?}", line.raw),
        }
    }
}
