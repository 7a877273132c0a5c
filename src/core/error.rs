//! Error types for the mediafire-dl library
//!
//! Provides comprehensive error handling for listing, resolution and
//! download operations.

use std::fmt;

/// Main error type for mediafire-dl operations
#[derive(Debug)]
pub enum Error {
    /// The input URL does not contain a recognizable folder key
    InvalidLink(String),

    /// A listing response did not have the expected shape
    InvalidContainer(String),

    /// A folder or file could not be resolved (unreachable, deleted or blocked)
    Resolution(String),

    /// Non-success status or stream failure while fetching bytes
    Transport(String),

    /// Network connectivity issues
    Network(String),

    /// File I/O error
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLink(url) => {
                write!(f, "Invalid link: no folder key in '{}'", url)
            }
            Error::InvalidContainer(msg) => {
                write!(f, "Invalid folder listing: {}", msg)
            }
            Error::Resolution(msg) => {
                write!(f, "Resolution failed: {}", msg)
            }
            Error::Transport(msg) => {
                write!(f, "Transport error: {}", msg)
            }
            Error::Network(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::Network(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

/// Convenience result type for mediafire-dl operations
pub type Result<T> = std::result::Result<T, Error>;
