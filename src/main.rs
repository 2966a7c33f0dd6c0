//! hatcogd - Hatcog IRC gateway daemon.
//!
//! Dials the configured networks and prints every received line to stdout
//! as one JSON object per line.

use hatcog_proto::Line;
use hatcogd::config::{Config, NetworkConfig};
use hatcogd::network::{ConnectOptions, ConnectionManager, line_channel};
use hatcogd::raw_log::{FileRawLog, NullRawLog, RawLog};
use hatcogd::telemetry::spans;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the line stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hatcogd.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        networks = config.networks.len(),
        version = %config.gateway.client_version,
        "Starting hatcogd"
    );

    let raw_log: Arc<dyn RawLog> = match &config.raw_log.path {
        Some(path) => {
            let log = FileRawLog::open(path)?;
            info!(path = %path.display(), "Logging raw IRC traffic");
            Arc::new(log)
        }
        None => Arc::new(NullRawLog),
    };

    let (lines_tx, lines_rx) = line_channel(config.gateway.channel_capacity);
    let manager = Arc::new(
        ConnectionManager::new(lines_tx, config.gateway.settings(), raw_log).with_default_options(
            ConnectOptions {
                registration: config.default_registration(),
                ..ConnectOptions::default()
            },
        ),
    );

    let printer = tokio::spawn(async move {
        if let Err(e) = print_lines(lines_rx, tokio::io::stdout()).await {
            error!(error = %e, "Failed to write to stdout");
        }
    });

    for network in config.networks.iter().filter(|n| n.autoconnect) {
        let manager = Arc::clone(&manager);
        let network = network.clone();
        let options = network.connect_options(config.identity.as_ref());
        let span = spans::autoconnect(&network.address);
        tokio::spawn(autoconnect(manager, network, options).instrument(span));
    }

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");

    manager.shutdown().await;
    printer.abort();

    info!("Shutdown complete");
    Ok(())
}

async fn autoconnect(manager: Arc<ConnectionManager>, network: NetworkConfig, options: ConnectOptions) {
    if let Err(e) = manager.connect_with(&network.address, options).await {
        error!(error = %e, code = e.error_code(), "Failed to connect");
        return;
    }

    if let Some(password) = &network.password
        && let Err(e) = manager.identify(&network.address, password).await
    {
        warn!(error = %e, code = e.error_code(), "Failed to identify");
    }
}

/// Write each line to `out` as JSON, one object per line.
///
/// Lines that fail to serialize are skipped. A failed write or flush ends
/// the stream with that error.
async fn print_lines<W>(mut lines: mpsc::Receiver<Line>, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        let mut json = match serde_json::to_string(&line) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, raw = %line.raw, "Failed to serialize line");
                continue;
            }
        };
        json.push('\n');
        out.write_all(json.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
