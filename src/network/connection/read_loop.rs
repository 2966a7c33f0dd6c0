//! Inbound half of a connection.

use super::Connection;
use super::commands::auto_response;
use super::error_handling::{ReadOutcome, classify_read};
use crate::error::ConnectionError;
use crate::network::stream::IrcStream;
use crate::raw_log::Direction;
use futures_util::StreamExt;
use hatcog_proto::{Line, LineCodec, decode_line};
use std::sync::Arc;
use tokio::io::ReadHalf;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

/// Read lines until EOF, a transport error, or shutdown.
///
/// Each read is bounded by the configured read timeout so the shutdown
/// token is observed even on a silent network.
pub(super) async fn run(
    conn: Arc<Connection>,
    reader: ReadHalf<IrcStream>,
    lines: mpsc::Sender<Line>,
) -> Result<(), ConnectionError> {
    let mut framed = FramedRead::new(reader, LineCodec::new());
    let address = conn.address.as_str();

    let result = loop {
        if conn.shutdown.is_cancelled() {
            break Ok(());
        }

        let read = tokio::select! {
            biased;
            _ = conn.shutdown.cancelled() => break Ok(()),
            read = timeout(conn.settings.read_timeout, framed.next()) => read,
        };

        let raw = match classify_read(read) {
            ReadOutcome::Idle => continue,
            ReadOutcome::Eof => {
                info!("Server closed connection");
                break Ok(());
            }
            ReadOutcome::Failed(e) => {
                error!(error = %e, "Read failed, closing connection");
                break Err(ConnectionError::Read(e));
            }
            ReadOutcome::Line(raw) => raw,
        };
        if raw.is_empty() {
            continue;
        }

        let text = decode_line(&raw);
        conn.raw_log.record(address, Direction::Inbound, &text);

        let line: Line = match text.parse() {
            Ok(line) => line,
            Err(e) => {
                warn!(raw = %text, error = %e, "Dropping malformed line");
                continue;
            }
        };

        if let Some(reply) = auto_response(&line, &conn.settings) {
            match conn.send_raw(&reply).await {
                Ok(()) => {}
                // Shutdown abandoned the reply.
                Err(ConnectionError::Closed) => break Ok(()),
                Err(e) => break Err(e),
            }
        }

        tokio::select! {
            biased;
            _ = conn.shutdown.cancelled() => break Ok(()),
            sent = lines.send(line) => {
                if sent.is_err() {
                    debug!("Line receiver dropped, stopping reads");
                    break Ok(());
                }
            }
        }
    };

    conn.finish().await;
    result
}
