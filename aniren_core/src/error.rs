//! Error types for the aniren Core Library
//!
//! Protocol failures keep their own type (`ProtocolError`) because every one of
//! them is terminal for the run; everything else is grouped here.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::protocol::error::ProtocolError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the aniren Core Library
#[derive(Error, Debug)]
pub enum Error {
    /// AniDB protocol errors (always fatal for the session)
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Reading the input stream failed
    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),

    /// A single rename failed
    #[error("Failed to rename \"{}\" to \"{}\": {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a rename error
    pub fn rename(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Status code reported by AniDB, if the error came from a reply
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Self::Protocol(err) => err.server_code(),
            _ => None,
        }
    }

    /// Whether this error must stop the whole run
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_fatal(),
            Self::Config { .. } | Self::Io(_) => true,
            Self::Rename { .. } => false,
        }
    }
}
