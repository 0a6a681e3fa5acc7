//! Configuration system
//!
//! Loads ~/.config/gifview/config.yaml with settings for:
//! - The HTTP listener, CORS and static frontend files
//! - Cache location, sweep interval and per-operation TTLs
//! - The upstream API client
//! - The media proxy allowlist

mod server_config;
pub mod validation;

pub use server_config::{CacheSection, CacheTtls, ProxySection, ServerConfig, UpstreamSection};
pub use validation::{validate_config, validate_config_result, ValidationError};
