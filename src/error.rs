//! Crate-level error type
//!
//! Registry operations have their own [`RegistryError`](crate::registry::RegistryError);
//! this type covers the serving side.

use std::net::SocketAddr;

/// Result alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the HTTP server
#[derive(Debug)]
pub enum Error {
    /// Could not bind the listening socket
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    /// I/O failure while serving
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Bind { addr, source } => write!(f, "failed to bind {}: {}", addr, source),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Bind { source, .. } => Some(source),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
