//! Unified error handling for hatcogd.
//!
//! Transport failures are scoped to the one network they happen on: they
//! come back as a [`ConnectionError`] from the Connection's task or from the
//! send that hit them, never as a process exit.

use thiserror::Error;

// ============================================================================
// Connection Errors (one network)
// ============================================================================

/// Errors raised by a single outbound Connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid network address {0:?}: expected host:port")]
    InvalidAddress(String),

    #[error("failed to connect to {address}: {source}")]
    Dial {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    #[error("TLS handshake with {address} failed: {source}")]
    Tls {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("write error: {0}")]
    Write(#[source] std::io::Error),

    #[error("connection closed")]
    Closed,

    #[error("empty command")]
    EmptyCommand,

    #[error("message text must not contain CR or LF")]
    LineBreak,
}

impl ConnectionError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::Dial { .. } => "dial_failed",
            Self::InvalidServerName(_) => "invalid_server_name",
            Self::Tls { .. } => "tls_failed",
            Self::Read(_) => "read_error",
            Self::Write(_) => "write_error",
            Self::Closed => "closed",
            Self::EmptyCommand => "empty_command",
            Self::LineBreak => "line_break",
        }
    }

    /// Whether the error ended the Connection's life.
    pub fn is_transport_fatal(&self) -> bool {
        matches!(
            self,
            Self::Dial { .. } | Self::Tls { .. } | Self::Read(_) | Self::Write(_) | Self::Closed
        )
    }
}

// ============================================================================
// Manager Errors (lookup and lifecycle)
// ============================================================================

/// Errors raised by the ConnectionManager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("manager shut down while connecting to {0}")]
    ShutDown(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ManagerError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownNetwork(_) => "unknown_network",
            Self::ShutDown(_) => "shut_down",
            Self::Connection(e) => e.error_code(),
        }
    }
}
