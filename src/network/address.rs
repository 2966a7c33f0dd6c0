//! Network addresses.
//!
//! A network is identified by the `host:port` string it was dialed with.
//! IPv6 literals use brackets: `[2001:db8::1]:6697`.

use crate::error::ConnectionError;
use std::fmt;

/// Standard IRC-over-TLS port.
/// <https://blog.freenode.net/2011/02/port-6697-irc-via-tlsssl/>
pub const TLS_PORT: u16 = 6697;

/// A parsed `host:port` address. Displays as the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAddress {
    raw: String,
    host: String,
    port: u16,
}

impl NetworkAddress {
    pub fn parse(address: &str) -> Result<Self, ConnectionError> {
        let invalid = || ConnectionError::InvalidAddress(address.to_owned());

        let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
        let host = match host.strip_prefix('[') {
            Some(v6) => v6.strip_suffix(']').ok_or_else(invalid)?,
            None if host.contains(':') => return Err(invalid()),
            None => host,
        };
        if host.is_empty() {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;

        Ok(Self {
            raw: address.to_owned(),
            host: host.to_owned(),
            port,
        })
    }

    /// The address as given, used as the manager's lookup key.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Host without IPv6 brackets, used for DNS and TLS SNI.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_tls_port(&self) -> bool {
        self.port == TLS_PORT
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
