//! Text decoding for raw IRC lines.
//!
//! IRC mandates no line encoding. Modern networks send UTF-8, legacy clients
//! still emit ISO-8859-1 or Windows-1252 bytes. A line that is valid UTF-8 is
//! taken as UTF-8; anything else is read as ISO-8859-1, where every byte is
//! the code point of the same value. ISO-8859-1 is a subset of Unicode, so
//! decoding never fails.

use std::borrow::Cow;

/// Decode one raw line to text.
///
/// Borrows the input when it is valid UTF-8.
///
/// # Example
///
/// ```
/// use hatcog_proto::decode_line;
///
/// assert_eq!(decode_line(b"caf\xc3\xa9"), "café");
/// assert_eq!(decode_line(b"caf\xe9"), "café");
/// ```
pub fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(raw.iter().map(|&b| char::from(b)).collect()),
    }
}
