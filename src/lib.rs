//! hatcogd - outbound IRC network connections for the hatcog gateway.
//!
//! A [`ConnectionManager`] owns one [`Connection`] per network address.
//! Every connection answers PING and CTCP VERSION on its own and forwards
//! each parsed line into a single shared channel.

pub mod config;
pub mod error;
pub mod network;
pub mod raw_log;
pub mod telemetry;

pub use error::{ConnectionError, ManagerError};
pub use hatcog_proto::Line;
pub use network::{
    ConnectOptions, Connection, ConnectionManager, ConnectionSettings, ConnectionState,
    Registration, TlsMode, line_channel,
};
