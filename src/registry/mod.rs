//! Stream registry with timer-driven auto-finish
//!
//! The registry owns every stream record and every pending finish timer.
//! All operations go through a single lock, and the finish callback takes the
//! same lock, so the externally visible behavior is that of a single sequence
//! of operations.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌─────────────────────────────┐
//!                     │ RwLock<Tables {             │
//!                     │   streams: HashMap<Id,      │
//!                     │     Stream>,                │
//!                     │   timers: HashMap<Id,       │
//!                     │     FinishTimer>,           │
//!                     │ }>                          │
//!                     └──────────────┬──────────────┘
//!                                    │
//!         ┌──────────────────────────┼──────────────────────────┐
//!         │                          │                          │
//!         ▼                          ▼                          ▼
//!   [HTTP handler]             [HTTP handler]            [finish timer]
//!   start()/interrupt()        list()                    sleep_until(deadline)
//!         │                          │                          │
//!         └──────── write lock ──────┴──── read lock ───────────┘
//! ```
//!
//! # Timer races
//!
//! Cancelling a timer aborts its task, which is best-effort: the task may
//! already be waiting on the lock. Every timer therefore carries a generation
//! number, and `finish` only acts if the stream is still `interrupted` *and*
//! the timer table still holds that generation for it. A late timer sees a
//! changed state or a newer generation and does nothing.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;
mod timer;

pub use config::RegistryConfig;
pub use entry::{Operation, Stream, StreamId, StreamState};
pub use error::{ErrorKind, RegistryError};
pub use store::StreamRegistry;
