//! Stream registry implementation
//!
//! The central registry that owns all stream records and their finish timers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tokio::runtime::Handle;
use tokio::time::Instant;

use super::config::RegistryConfig;
use super::entry::{Operation, Stream, StreamId, StreamState};
use super::error::RegistryError;
use super::timer::{FinishTimer, TimerTable};

/// Everything guarded by the registry lock
#[derive(Default)]
struct Tables {
    streams: HashMap<StreamId, Stream>,
    timers: TimerTable,
    /// Last generation handed to a finish timer
    generation: u64,
}

impl Tables {
    /// Apply a fired finish timer
    ///
    /// No-op unless the stream still exists, is still interrupted, and
    /// `generation` is still its pending timer.
    fn finish(&mut self, id: &StreamId, generation: u64) {
        let Some(stream) = self.streams.get_mut(id) else {
            tracing::debug!(stream = %id, "Finish skipped: stream deleted");
            return;
        };

        let Some(next) = stream.state.after(Operation::Finish) else {
            tracing::debug!(
                stream = %id,
                state = %stream.state,
                "Finish skipped: stream not interrupted"
            );
            return;
        };

        if !self.timers.is_current(id, generation) {
            tracing::debug!(
                stream = %id,
                generation = generation,
                "Finish skipped: timer superseded"
            );
            return;
        }

        self.timers.clear_fired(id, generation);
        stream.state = next;

        tracing::info!(stream = %id, "Stream finished");
    }
}

/// Central registry for all streams
///
/// Thread-safe via a single `RwLock` over the record map and the timer table.
/// Every operation is synchronous and holds the lock only for the duration
/// of a map update, so it can be called from async handlers and plain
/// threads alike. Finish timers run on the tokio runtime captured at
/// construction.
pub struct StreamRegistry {
    tables: Arc<RwLock<Tables>>,

    /// Configuration
    config: RegistryConfig,

    /// Runtime the finish timers are spawned on
    runtime: Handle,
}

impl StreamRegistry {
    /// Create a new stream registry with default configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; use
    /// [`with_runtime`](Self::with_runtime) there.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new stream registry with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    /// Create a registry whose finish timers run on `runtime`
    pub fn with_runtime(config: RegistryConfig, runtime: Handle) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            config,
            runtime,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a new stream in the `created` state
    pub fn create(&self) -> Stream {
        let stream = Stream::new();

        let mut tables = self.write();
        tables.streams.insert(stream.id.clone(), stream.clone());

        tracing::info!(
            stream = %stream.id,
            created_at = %stream.created_at,
            "Stream created"
        );

        stream
    }

    /// Snapshot of all streams, in no particular order
    pub fn list(&self) -> Vec<Stream> {
        self.read().streams.values().cloned().collect()
    }

    /// Snapshot of a single stream
    pub fn get(&self, id: &StreamId) -> Option<Stream> {
        self.read().streams.get(id).cloned()
    }

    /// Start a stream
    ///
    /// Allowed from `created`, `active` and `interrupted`. Starting an
    /// interrupted stream cancels its pending finish.
    pub fn start(&self, id: &StreamId) -> Result<(), RegistryError> {
        let mut guard = self.write();
        let tables = &mut *guard;

        let stream = tables
            .streams
            .get_mut(id)
            .ok_or_else(|| RegistryError::StreamNotFound(id.clone()))?;
        let from = stream.state;
        let next = transition(id, from, Operation::Start)?;

        if from == StreamState::Interrupted {
            cancel_finish_timer(&mut tables.timers, id);
        }
        stream.state = next;

        tracing::debug!(stream = %id, from = %from, "Stream started");
        Ok(())
    }

    /// Interrupt an active stream and schedule its finish
    pub fn interrupt(&self, id: &StreamId) -> Result<(), RegistryError> {
        let mut guard = self.write();
        let tables = &mut *guard;

        let stream = tables
            .streams
            .get_mut(id)
            .ok_or_else(|| RegistryError::StreamNotFound(id.clone()))?;
        let next = transition(id, stream.state, Operation::Interrupt)?;

        tables.generation += 1;
        let generation = tables.generation;
        let deadline = Instant::now() + self.config.finish_after;
        let handle = self.runtime.spawn(finish_at(
            Arc::downgrade(&self.tables),
            id.clone(),
            generation,
            deadline,
        ));
        tables
            .timers
            .arm(id.clone(), FinishTimer::new(generation, handle));
        stream.state = next;

        tracing::debug!(
            stream = %id,
            generation = generation,
            finish_after_ms = self.config.finish_after.as_millis() as u64,
            "Stream interrupted, finish scheduled"
        );
        Ok(())
    }

    /// Remove a stream, cancelling its pending finish if any
    pub fn delete(&self, id: &StreamId) -> Result<(), RegistryError> {
        let mut guard = self.write();
        let tables = &mut *guard;

        let state = tables
            .streams
            .get(id)
            .map(|stream| stream.state)
            .ok_or_else(|| RegistryError::StreamNotFound(id.clone()))?;

        if state == StreamState::Interrupted {
            cancel_finish_timer(&mut tables.timers, id);
        }
        tables.streams.remove(id);

        tracing::info!(stream = %id, state = %state, "Stream deleted");
        Ok(())
    }

    /// Get total number of streams
    pub fn stream_count(&self) -> usize {
        self.read().streams.len()
    }

    /// Number of finish timers currently pending
    pub fn pending_timers(&self) -> usize {
        self.read().timers.len()
    }

    /// Drop the timer entry of `id` without touching its state
    #[cfg(test)]
    pub(crate) fn forget_timer(&self, id: &StreamId) -> bool {
        self.write().timers.cancel(id)
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StreamRegistry {
    fn drop(&mut self) {
        self.write().timers.cancel_all();
    }
}

fn transition(
    id: &StreamId,
    from: StreamState,
    op: Operation,
) -> Result<StreamState, RegistryError> {
    from.after(op).ok_or_else(|| RegistryError::InvalidTransition {
        id: id.clone(),
        from,
        op,
    })
}

/// Cancel the timer of a stream that is leaving `interrupted`
///
/// # Panics
///
/// Panics if there is no timer: every interrupted stream has exactly one, so
/// a missing entry means the tables are corrupt.
fn cancel_finish_timer(timers: &mut TimerTable, id: &StreamId) {
    let cancelled = timers.cancel(id);
    assert!(
        cancelled,
        "stream {} is interrupted but has no finish timer",
        id
    );
    tracing::debug!(stream = %id, "Finish timer cancelled");
}

/// Body of a finish timer task
async fn finish_at(
    tables: Weak<RwLock<Tables>>,
    id: StreamId,
    generation: u64,
    deadline: Instant,
) {
    tokio::time::sleep_until(deadline).await;

    // Registry dropped while we slept
    let Some(tables) = tables.upgrade() else {
        return;
    };
    let mut tables = tables.write().unwrap_or_else(PoisonError::into_inner);
    tables.finish(&id, generation);
}
