//! gifview - caching backend for a lightweight GIF browsing frontend
//!
//! Re-exposes creator profiles, creator listings, search and trending from
//! the RedGifs API, memoizing every response in a local SQLite store with a
//! per-operation time-to-live, and proxies media files from allowlisted
//! hosts.
//!
//! # Architecture
//!
//! - **cache**: Durable expiring key-value store and cache key derivation
//! - **provider**: Upstream access behind a lazily-built shared handle
//! - **server**: axum routes, parameter validation, response payloads
//! - **proxy**: Stateless media passthrough
//! - **sweeper**: Periodic removal of expired entries
//! - **config**: YAML configuration with defaults and validation

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod proxy;
pub mod server;
pub mod sweeper;

// Re-exports
pub use error::{GifviewError, Result};
