//! Registry error types
//!
//! Error types for stream registry operations.

use super::entry::{Operation, StreamId, StreamState};

/// Coarse classification of a [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The id is not in the registry
    NotFound,
    /// The requested change is not allowed from the current state
    InvalidTransition,
}

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Stream not found
    StreamNotFound(StreamId),
    /// Operation not allowed from the stream's current state
    InvalidTransition {
        id: StreamId,
        from: StreamState,
        op: Operation,
    },
}

impl RegistryError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::StreamNotFound(_) => ErrorKind::NotFound,
            RegistryError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    /// Id of the stream the failed operation referenced
    pub fn stream_id(&self) -> &StreamId {
        match self {
            RegistryError::StreamNotFound(id) => id,
            RegistryError::InvalidTransition { id, .. } => id,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamNotFound(id) => {
                write!(f, "could not find stream with id {}", id)
            }
            RegistryError::InvalidTransition { id, from, op } => {
                let reason = match (op, from) {
                    _ if from.is_terminal() => "stream is already finished",
                    (Operation::Interrupt, _) => "stream is not active",
                    _ => "transition not allowed",
                };
                write!(
                    f,
                    "could not change state of stream {} ({}: cannot {} from {})",
                    id, reason, op, from
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}
