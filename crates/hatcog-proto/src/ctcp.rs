//! CTCP (Client-to-Client Protocol) framing.
//!
//! CTCP requests and replies travel inside `PRIVMSG`/`NOTICE` bodies,
//! delimited by the `\x01` byte.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use hatcog_proto::ctcp::{self, Ctcp, CtcpKind};
//!
//! let parsed = Ctcp::parse("\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(parsed.kind, CtcpKind::Action);
//! assert_eq!(parsed.params, Some("waves hello"));
//!
//! assert_eq!(ctcp::action("dances"), "\x01ACTION dances\x01");
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// CTCP verbs the gateway distinguishes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION, sent by `/me`.
    Action,
    /// VERSION, asks for the client's version string.
    Version,
    /// PING, latency check.
    Ping,
    /// Anything else.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a CTCP verb, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Canonical uppercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CTCP payload borrowed from a message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The CTCP verb.
    pub kind: CtcpKind,
    /// Text after the verb, if any.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a CTCP payload from a `PRIVMSG`/`NOTICE` body.
    ///
    /// The closing delimiter is optional, some clients omit it.
    /// Returns `None` if the body is not CTCP.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);

        if text.is_empty() {
            return None;
        }

        let (command, params) = match text.split_once(' ') {
            Some((command, params)) if !params.is_empty() => (command, Some(params)),
            Some((command, _)) => (command, None),
            None => (text, None),
        };

        Some(Self {
            kind: CtcpKind::parse(command),
            params,
        })
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params {
            Some(params) => write!(f, "{CTCP_DELIM}{} {params}{CTCP_DELIM}", self.kind),
            None => write!(f, "{CTCP_DELIM}{}{CTCP_DELIM}", self.kind),
        }
    }
}

/// Frame an ACTION (`/me`) body.
pub fn action(text: &str) -> String {
    Ctcp {
        kind: CtcpKind::Action,
        params: Some(text),
    }
    .to_string()
}

/// Frame a VERSION reply body.
pub fn version_reply(version: &str) -> String {
    Ctcp {
        kind: CtcpKind::Version,
        params: Some(version),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_request() {
        let ctcp = Ctcp::parse("\x01VERSION\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.params, None);
    }

    #[test]
    fn test_parse_lowercase_and_unterminated() {
        let ctcp = Ctcp::parse("\x01action waves").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.params, Some("waves"));
    }

    #[test]
    fn test_not_ctcp() {
        assert!(Ctcp::parse("hello").is_none());
        assert!(Ctcp::parse("\x01\x01").is_none());
    }

    #[test]
    fn test_unknown_kind_keeps_name() {
        let ctcp = Ctcp::parse("\x01CLIENTINFO\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Unknown("CLIENTINFO".into()));
    }

    #[test]
    fn test_framing_helpers() {
        assert_eq!(action("waves"), "\x01ACTION waves\x01");
        assert_eq!(version_reply("hatcogd 0.1"), "\x01VERSION hatcogd 0.1\x01");
    }
}
