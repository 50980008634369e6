//! HTTP front end
//!
//! Maps each registry operation onto a REST endpoint and encodes results as
//! JSON:API documents. All state lives in the [`StreamRegistry`](crate::registry::StreamRegistry);
//! handlers only translate.

pub mod config;
pub mod jsonapi;
pub mod listener;
pub mod middleware;
pub mod routes;

pub use config::ServerConfig;
pub use listener::ApiServer;
