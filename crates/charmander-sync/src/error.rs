//! Error types for the sync engine.

use thiserror::Error;

/// Sync errors.
///
/// Nothing here is fatal to the hosting process: every failure degrades
/// to "retry on the next cycle".
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed reply from the store.
    #[error("protocol error: {0}")]
    Protocol(#[from] charmander_proto::ProtocolError),

    /// I/O error while talking to the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store closed the connection mid-reply.
    #[error("connection closed by store")]
    ConnectionClosed,

    /// Entity could not be serialised for publication.
    #[error("serialisation error: {0}")]
    Serialisation(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
