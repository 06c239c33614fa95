//! Stockroom - concurrent HTTP/1.1 server with a durable JSON entity store
//!
//! Core library for the HTTP layer, routing, handlers and storage.

pub mod config;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;
pub mod store;
