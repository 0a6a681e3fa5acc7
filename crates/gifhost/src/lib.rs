//! Typed async client for the RedGifs v2 HTTP API
//!
//! Covers the read-only lookups a browsing frontend needs: creator profiles,
//! creator listings, tag search and trending.
//!
//! # Example
//!
//! ```no_run
//! use gifhost::{Client, Order};
//!
//! # async fn run() -> gifhost::Result<()> {
//! let client = Client::with_defaults()?;
//! client.login().await?;
//!
//! let results = client.search("cats", 1, 40, Order::Trending).await?;
//! println!("{} results over {} pages", results.total, results.pages);
//!
//! let trending = client.trending_gifs().await?;
//! println!("{} trending", trending.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod types;

pub use client::{Client, ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, SITE_ORIGIN};
pub use types::{CreatorSearch, Gif, GifSearch, MediaUrls, Order, User};

use thiserror::Error;

/// Errors that can occur when talking to the upstream API
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream rejected the access token")]
    Unauthorized,

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid sort order: {0}")]
    InvalidOrder(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Error::Status { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Result type for upstream operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let server_error = Error::Status {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(server_error.is_transient());

        let client_error = Error::Status {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(!client_error.is_transient());

        assert!(!Error::NotFound("user x".to_string()).is_transient());
        assert!(!Error::RateLimited { retry_after: 5 }.is_transient());
        assert!(!Error::Unauthorized.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = Error::RateLimited { retry_after: 30 };
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");

        let err = Error::NotFound("user nobody".to_string());
        assert_eq!(err.to_string(), "Not found: user nobody");
    }
}
