//! # hatcog-proto
//!
//! The IRC wire pieces used by the hatcog gateway's outbound connections.
//!
//! ## Features
//!
//! - [`Line`]: a structured IRC line with tags, prefix, command and arguments
//! - [`Prefix`]: message origin (`nick!user@host` or a server name)
//! - [`ctcp`]: building and recognising `\x01`-framed CTCP payloads
//! - [`decode_line`]: UTF-8 decoding with an ISO-8859-1 fallback
//! - [`LineCodec`]: newline framing over any async byte stream (feature `tokio`)
//!
//! ## Parsing
//!
//! ```rust
//! use hatcog_proto::Line;
//!
//! let line: Line = ":nick!user@host PRIVMSG #rust :hello".parse().unwrap();
//! assert_eq!(line.command, "PRIVMSG");
//! assert_eq!(line.user(), "nick");
//! assert_eq!(line.content(), Some("hello"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

#[cfg(feature = "tokio")]
pub mod codec;
pub mod ctcp;
pub mod encoding;
pub mod error;
pub mod line;
mod nom_parser;
pub mod prefix;

#[cfg(feature = "tokio")]
pub use self::codec::{LineCodec, MAX_IRC_LINE_LEN};
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::encoding::decode_line;
pub use self::error::ParseError;
pub use self::line::{Line, Tag};
pub use self::prefix::Prefix;
