//! The structured IRC line.
//!
//! A [`Line`] is what the gateway hands to its consumers: the parsed
//! command, arguments and origin, together with the raw text so a line can
//! be forwarded untouched.

use std::str::FromStr;

use crate::ctcp::{Ctcp, CtcpKind};
use crate::error::ParseError;
use crate::nom_parser::ParsedLine;
use crate::prefix::Prefix;

/// An IRCv3 message tag. `value` is `None` for value-less tags.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag {
    /// Tag key, including any vendor prefix or `+`.
    pub key: String,
    /// Unescaped tag value.
    pub value: Option<String>,
}

/// One parsed IRC line.
///
/// `command` is upper-cased. A `PRIVMSG` that carries a CTCP `VERSION`
/// request or an `ACTION` gets that verb as its command, with `args` left
/// as received.
///
/// # Example
///
/// ```
/// use hatcog_proto::Line;
///
/// let line: Line = ":bob!b@host PRIVMSG me :\x01VERSION\x01".parse().unwrap();
/// assert_eq!(line.command, "VERSION");
/// assert_eq!(line.user(), "bob");
/// assert_eq!(line.args, vec!["me", "\x01VERSION\x01"]);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Line {
    /// The line as received, without its terminator.
    pub raw: String,
    /// IRCv3 tags, empty when the line had none.
    pub tags: Vec<Tag>,
    /// Origin of the line.
    pub prefix: Option<Prefix>,
    /// Command verb or three digit numeric.
    pub command: String,
    /// Parameters, the trailing one included.
    pub args: Vec<String>,
}

impl Line {
    /// Nick (or server name) the line came from; empty without a prefix.
    pub fn user(&self) -> &str {
        self.prefix.as_ref().map(Prefix::name).unwrap_or("")
    }

    /// First parameter, usually the target channel or nick.
    pub fn target(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Last parameter, the message body for `PRIVMSG`/`NOTICE`.
    pub fn content(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// The CTCP payload of a `PRIVMSG`/`NOTICE` body, if it is one.
    pub fn ctcp(&self) -> Option<Ctcp<'_>> {
        if self.args.len() < 2 {
            return None;
        }
        Ctcp::parse(self.content()?)
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .and_then(|t| t.value.as_deref())
    }
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Line, Self::Err> {
        let raw = s.trim_end_matches(['\r', '\n']);
        let parsed = ParsedLine::parse(raw)?;

        let mut command = parsed.command.to_ascii_uppercase();
        let args: Vec<String> = parsed.params.iter().map(|p| (*p).to_owned()).collect();

        if command == "PRIVMSG" && args.len() >= 2 {
            match Ctcp::parse(&args[args.len() - 1]).map(|c| c.kind) {
                Some(CtcpKind::Version) => command = "VERSION".to_owned(),
                Some(CtcpKind::Action) => command = "ACTION".to_owned(),
                _ => {}
            }
        }

        Ok(Line {
            raw: raw.to_owned(),
            tags: parsed.tags.map(parse_tags).unwrap_or_default(),
            prefix: parsed.prefix.map(Prefix::parse),
            command,
            args,
        })
    }
}

fn parse_tags(tags: &str) -> Vec<Tag> {
    tags.split(';')
        .filter(|s| !s.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((key, value)) => Tag {
                key: key.to_owned(),
                value: Some(unescape_tag_value(value)),
            },
            None => Tag {
                key: tag.to_owned(),
                value: None,
            },
        })
        .collect()
}

/// IRCv3 tag value unescaping: `\:` `\s` `\\` `\r` `\n`. A backslash before
/// any other character is dropped.
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
