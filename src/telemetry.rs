//! Standardized span constructors for gateway observability.

pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering the read task of one outbound connection.
    pub fn connection(address: &str, tls: bool) -> Span {
        info_span!("connection", address = %address, tls)
    }

    /// Span for the startup dial of a configured network.
    pub fn autoconnect(address: &str) -> Span {
        info_span!("autoconnect", address = %address)
    }
}
