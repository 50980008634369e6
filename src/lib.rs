//! Stream lifecycle service
//!
//! Tracks named streams through a small state machine with a time-delayed
//! auto-finish:
//!
//! ```text
//! created --start--> active --interrupt--> interrupted --(finish_after)--> finished
//! active <---------------------start------- interrupted
//! ```
//!
//! The [`registry`] module is the core: an explicitly constructed, lock-guarded
//! store that owns every stream record and its pending finish timer. The
//! [`server`] module is a thin JSON:API front end over it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stream_api::{RegistryConfig, StreamRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(StreamRegistry::with_config(
//!         RegistryConfig::default().finish_after(Duration::from_secs(3)),
//!     ));
//!
//!     let stream = registry.create();
//!     registry.start(&stream.id).unwrap();
//!     registry.interrupt(&stream.id).unwrap();
//! }
//! ```

pub mod error;
pub mod registry;
pub mod server;

pub use error::{Error, Result};
pub use registry::{
    ErrorKind, Operation, RegistryConfig, RegistryError, Stream, StreamId, StreamRegistry,
    StreamState,
};
pub use server::{ApiServer, ServerConfig};
