//! Classification of read results for the connection read loop.

use bytes::BytesMut;
use std::io;
use tokio::time::error::Elapsed;

/// What the read loop should do with the result of one bounded read.
#[derive(Debug)]
pub(super) enum ReadOutcome {
    /// A complete line (terminator stripped, possibly empty).
    Line(BytesMut),
    /// The read deadline elapsed with no data. Not an error.
    Idle,
    /// The server closed the stream.
    Eof,
    /// Transport failure. The connection is unusable.
    Failed(io::Error),
}

/// Classify the result of `timeout(deadline, framed.next())`.
pub(super) fn classify_read(result: Result<Option<io::Result<BytesMut>>, Elapsed>) -> ReadOutcome {
    match result {
        Err(_elapsed) => ReadOutcome::Idle,
        Ok(None) => ReadOutcome::Eof,
        Ok(Some(Ok(line))) => ReadOutcome::Line(line),
        Ok(Some(Err(e))) if e.kind() == io::ErrorKind::UnexpectedEof => ReadOutcome::Eof,
        Ok(Some(Err(e))) => ReadOutcome::Failed(e),
    }
}
