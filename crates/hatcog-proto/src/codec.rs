//! Newline framing for raw IRC byte streams.
//!
//! [`LineCodec`] yields raw line bytes with the `\n` (and an optional `\r`
//! before it) removed. Decoding to text is left to the caller, since a line
//! may not be UTF-8 (see [`crate::decode_line`]).

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::warn;

/// Maximum IRC line length accepted (8191 bytes, modern IRC convention).
pub const MAX_IRC_LINE_LEN: usize = 8191;

/// Line codec for use with [`tokio_util::codec::FramedRead`].
///
/// A line longer than the limit is dropped up to its terminating newline
/// and reading carries on with the next one. The decoder never returns an
/// error of its own, so a single bad line cannot end the stream.
#[derive(Debug)]
pub struct LineCodec {
    next_index: usize,
    max_len: usize,
    discarding: bool,
}

impl LineCodec {
    /// Codec with the default [`MAX_IRC_LINE_LEN`] limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_IRC_LINE_LEN)
    }

    /// Codec with a custom line length limit (terminator excluded).
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    fn strip_terminator(mut line: BytesMut) -> BytesMut {
        if line.last() == Some(&b'\n') {
            line.truncate(line.len() - 1);
        }
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        line
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, Self::Error> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    if !self.discarding {
                        warn!(limit = self.max_len, "Discarding overlong IRC line");
                    }
                    src.clear();
                    self.discarding = true;
                    self.next_index = 0;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let end = self.next_index + offset + 1;
            self.next_index = 0;
            let line = Self::strip_terminator(src.split_to(end));

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_len {
                warn!(
                    length = line.len(),
                    limit = self.max_len,
                    "Discarding overlong IRC line"
                );
                continue;
            }
            return Ok(Some(line));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() || self.discarding {
            src.clear();
            self.discarding = false;
            return Ok(None);
        }
        Ok(Some(Self::strip_terminator(src.split())))
    }
}
