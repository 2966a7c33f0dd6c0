//! IRC message prefix.
//!
//! A prefix identifies the origin of a line: either a server name or a
//! user's `nick!user@host` mask.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

/// Origin of an IRC line.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Prefix {
    /// Server name (e.g. `irc.example.com`).
    Server {
        /// The server's name.
        name: String,
    },
    /// User mask. `user` and `host` are empty when the server omitted them.
    User {
        /// Nickname.
        nick: String,
        /// Username (ident).
        user: String,
        /// Hostname or cloak.
        host: String,
    },
}

impl Prefix {
    /// Parse a prefix, without its leading `:`.
    ///
    /// Lenient: a bare name containing a dot and no `!`/`@` is a server,
    /// everything else is a user mask.
    pub fn parse(s: &str) -> Self {
        let (name, host) = match s.split_once('@') {
            Some((name, host)) => (name, Some(host)),
            None => (s, None),
        };
        let (nick, user) = match name.split_once('!') {
            Some((nick, user)) => (nick, Some(user)),
            None => (name, None),
        };

        if user.is_none() && host.is_none() && nick.contains('.') {
            return Prefix::Server {
                name: nick.to_owned(),
            };
        }

        Prefix::User {
            nick: nick.to_owned(),
            user: user.unwrap_or_default().to_owned(),
            host: host.unwrap_or_default().to_owned(),
        }
    }

    /// The nickname for user prefixes, the server name otherwise.
    pub fn name(&self) -> &str {
        match self {
            Prefix::Server { name } => name,
            Prefix::User { nick, .. } => nick,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server { name } => f.write_str(name),
            Prefix::User { nick, user, host } => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}
