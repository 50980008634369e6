//! Stream record and state types
//!
//! This module defines the per-stream record stored in the registry and the
//! transition graph it moves along.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Opaque, unique identifier of a stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(String);

impl StreamId {
    /// Generate a fresh random (v4 UUID) id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Created, never started
    Created,
    /// Started
    Active,
    /// Interrupted, a finish timer is pending
    Interrupted,
    /// Terminal
    Finished,
}

impl StreamState {
    /// Lower-case name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamState::Created => "created",
            StreamState::Active => "active",
            StreamState::Interrupted => "interrupted",
            StreamState::Finished => "finished",
        }
    }

    /// Whether no operation may leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Finished)
    }

    /// State reached by applying `op`, or `None` if the graph has no such edge
    ///
    /// `start` on an already active stream is allowed and keeps it active.
    pub fn after(self, op: Operation) -> Option<StreamState> {
        match (self, op) {
            (
                StreamState::Created | StreamState::Active | StreamState::Interrupted,
                Operation::Start,
            ) => Some(StreamState::Active),
            (StreamState::Active, Operation::Interrupt) => Some(StreamState::Interrupted),
            (StreamState::Interrupted, Operation::Finish) => Some(StreamState::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-changing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Interrupt,
    /// Issued by the finish timer only
    Finish,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Start => "start",
            Operation::Interrupt => "interrupt",
            Operation::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// A stream record
///
/// Values handed out by the registry are copies; mutating them has no effect
/// on the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub id: StreamId,
    pub state: StreamState,
    pub created_at: DateTime<Utc>,
}

impl Stream {
    /// Create a new record in the `created` state
    pub(super) fn new() -> Self {
        Self {
            id: StreamId::generate(),
            state: StreamState::Created,
            created_at: Utc::now(),
        }
    }
}
