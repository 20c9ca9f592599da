//! Runtime error type for the client.
//!
//! Build-time selection errors live in [`crate::config::SelectionError`]; they
//! never reach a running firmware. Everything a running client can hit funnels
//! into [`Error`]. All variants are `Copy`.

use core::fmt;

use crate::storage::StorageError;

// ---------------------------------------------------------------------------
// Top-level client error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The selected filesystem failed to mount or to perform an operation.
    Storage(StorageError),
    /// The HTTP transport failed before a response arrived.
    Transport,
    /// The backend answered with a non-success status.
    Http(u16),
    /// A request or response body was malformed.
    Payload(&'static str),
    /// Runtime configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Transport => write!(f, "transport failed"),
            Self::Http(status) => write!(f, "HTTP status {status}"),
            Self::Payload(msg) => write!(f, "payload: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl Error {
    /// Map an HTTP status to `Ok` for 2xx, `Err(Http)` otherwise.
    pub fn check_status(status: u16) -> Result<()> {
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(Self::Http(status))
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Client-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
