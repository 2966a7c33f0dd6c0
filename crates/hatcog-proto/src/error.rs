//! Error types for IRC line parsing.

use thiserror::Error;

/// Convenience type alias for parse results.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Reasons the parser rejects a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Nothing but whitespace or line terminators.
    #[error("empty line")]
    EmptyLine,

    /// A tag block (`@...`) that is never followed by a space.
    #[error("unterminated tag block")]
    UnterminatedTags,

    /// A prefix with no command after it.
    #[error("missing command")]
    MissingCommand,

    /// The command is neither letters nor a three digit numeric.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),
}

impl ParseError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyLine => "empty_line",
            Self::UnterminatedTags => "unterminated_tags",
            Self::MissingCommand => "missing_command",
            Self::InvalidCommand(_) => "invalid_command",
        }
    }
}
