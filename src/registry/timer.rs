//! Finish timer bookkeeping
//!
//! One entry per interrupted stream. Entries are only touched while the
//! registry's write lock is held.

use std::collections::HashMap;

use tokio::task::JoinHandle;

use super::entry::StreamId;

/// A scheduled finish for one stream
#[derive(Debug)]
pub(super) struct FinishTimer {
    pub generation: u64,
    handle: JoinHandle<()>,
}

impl FinishTimer {
    pub fn new(generation: u64, handle: JoinHandle<()>) -> Self {
        Self { generation, handle }
    }

    /// Request the timer task to stop. The task may already be running.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Default)]
pub(super) struct TimerTable {
    timers: HashMap<StreamId, FinishTimer>,
}

impl TimerTable {
    /// Record the timer for `id`, cancelling any timer it replaces
    pub fn arm(&mut self, id: StreamId, timer: FinishTimer) {
        if let Some(previous) = self.timers.insert(id, timer) {
            previous.cancel();
        }
    }

    /// Cancel and forget the timer for `id`. Returns whether one existed.
    pub fn cancel(&mut self, id: &StreamId) -> bool {
        match self.timers.remove(id) {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether `generation` is the pending timer for `id`
    pub fn is_current(&self, id: &StreamId, generation: u64) -> bool {
        self.timers
            .get(id)
            .is_some_and(|timer| timer.generation == generation)
    }

    /// Forget the entry of a timer that has fired, without aborting it
    pub fn clear_fired(&mut self, id: &StreamId, generation: u64) {
        if self.is_current(id, generation) {
            self.timers.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
    }
}
