//! Network module.
//!
//! Outbound connections to IRC networks and the manager that owns them.

pub mod address;
mod connection;
mod manager;
mod stream;
pub mod tls;

pub use address::NetworkAddress;
pub use connection::{ConnectOptions, Connection, ConnectionSettings, ConnectionState, Registration};
pub use manager::ConnectionManager;
pub use stream::IrcStream;
pub use tls::TlsMode;

use hatcog_proto::Line;
use tokio::sync::mpsc;

/// The shared channel every connection forwards parsed lines into.
///
/// Bounded: a slow consumer makes read tasks wait instead of dropping lines.
pub fn line_channel(capacity: usize) -> (mpsc::Sender<Line>, mpsc::Receiver<Line>) {
    mpsc::channel(capacity)
}
