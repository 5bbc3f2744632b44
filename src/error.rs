use std::io;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("ERR - Io: {0}")]
    Io(#[from] io::Error),

    #[error("ERR - Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("ERR - Object not found: {0}")]
    ObjectNotFound(String),

    #[error("ERR - Corrupt object: {0}")]
    CorruptObject(String),

    #[error("ERR - Corrupt stream: {0}")]
    CorruptStream(String),

    #[error("ERR - Truncated tree: {0}")]
    TruncatedTree(String),

    #[error("ERR - Duplicate tree entry: {0}")]
    DuplicateEntry(String),

    #[error("ERR - Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("ERR - Ref discovery failed: {0}")]
    RefDiscoveryFailed(String),

    #[error("ERR - Network: {0}")]
    Network(String),

    #[error("ERR - Unpack failed: {0}")]
    UnpackFailed(String),
}

// Covers both transport failures and non-success statuses; reqwest puts the
// status in its message.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
