//! Default value functions for configuration.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Gateway Defaults
// =============================================================================

pub fn default_client_version() -> String {
    concat!("hatcogd ", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn default_pong_token() -> String {
    "hatcogd".to_string()
}

/// Lines buffered between all Connections and the consumer before the
/// Connections block.
pub fn default_channel_capacity() -> usize {
    1024
}

pub fn default_read_timeout_ms() -> u64 {
    1000
}

pub fn default_greeting_delay_ms() -> u64 {
    1000
}

/// Covers the TCP connect and the TLS handshake together.
pub fn default_connect_timeout_ms() -> u64 {
    30_000
}

/// Bound on writing one line. A peer that stops reading longer than this
/// loses its connection.
pub fn default_write_timeout_ms() -> u64 {
    30_000
}
