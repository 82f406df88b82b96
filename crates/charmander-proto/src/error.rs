//! Error types for the protocol.

use thiserror::Error;

/// Protocol errors.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reply opened with a type byte other than the expected one.
    #[error("unexpected reply type: expected {expected:?}, found {found:?}")]
    UnexpectedType { expected: char, found: char },

    /// Length or count line could not be parsed.
    #[error("invalid length in reply: {0}")]
    InvalidLength(String),

    /// Value line carries fewer bytes than its length line declared.
    #[error("bulk value shorter than declared: declared {declared}, line has {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// The store answered with an error reply.
    #[error("error reply from store: {0}")]
    ErrorReply(String),

    /// Reply bytes are not valid UTF-8.
    #[error("reply is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
