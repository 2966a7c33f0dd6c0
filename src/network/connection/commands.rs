//! Outbound line construction and automatic replies.

use crate::error::ConnectionError;
use crate::network::ConnectionSettings;
use hatcog_proto::{Line, ctcp};

/// A line break would end the line early and start another command.
fn single_line(parts: &[&str]) -> Result<(), ConnectionError> {
    if parts.iter().any(|part| part.contains(['\r', '\n'])) {
        return Err(ConnectionError::LineBreak);
    }
    Ok(())
}

/// `PRIVMSG <target> :<text>`
pub(crate) fn privmsg(target: &str, text: &str) -> Result<String, ConnectionError> {
    single_line(&[target, text])?;
    Ok(format!("PRIVMSG {target} :{text}"))
}

/// `PRIVMSG <target> :\x01ACTION <text>\x01`
pub(crate) fn action(target: &str, text: &str) -> Result<String, ConnectionError> {
    privmsg(target, &ctcp::action(text))
}

/// Registration burst sent after the greeting delay.
pub(crate) fn registration(nick: &str, name: &str) -> Result<[String; 2], ConnectionError> {
    single_line(&[nick, name])?;
    Ok([
        format!("USER {nick} localhost localhost :{name}"),
        format!("NICK {nick}"),
    ])
}

/// Turn user-typed command text into a raw line.
///
/// A leading `/` is dropped and a first token of exactly `msg` becomes
/// `privmsg`. Everything else is passed through verbatim. Returns `None`
/// when nothing is left to send.
pub(crate) fn rewrite_command(text: &str) -> Option<String> {
    let text = text.strip_prefix('/').unwrap_or(text);
    if text.trim().is_empty() {
        return None;
    }

    match text.split_once(' ') {
        Some(("msg", rest)) => Some(format!("privmsg {rest}")),
        None if text == "msg" => Some("privmsg".to_string()),
        _ => Some(text.to_string()),
    }
}

/// Reply the connection sends on its own when it sees `line`.
///
/// PING gets a PONG with the configured token and a CTCP VERSION request
/// gets a NOTICE with the client version. A VERSION request with no
/// sender has nobody to answer and is left alone.
pub(crate) fn auto_response(line: &Line, settings: &ConnectionSettings) -> Option<String> {
    match line.command.as_str() {
        "PING" => Some(format!("PONG {}", settings.pong_token)),
        "VERSION" if !line.user().is_empty() => Some(format!(
            "NOTICE {} :{}",
            line.user(),
            ctcp::version_reply(&settings.client_version)
        )),
        _ => None,
    }
}
