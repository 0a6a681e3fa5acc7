//! Content provider abstraction
//!
//! The handler layer talks to the upstream API through [`ContentProvider`],
//! obtained from a [`ProviderHandle`] that builds the real client on first
//! use. Tests substitute their own implementation.

mod handle;
pub mod retry;
mod upstream;

pub use handle::ProviderHandle;
pub use retry::{with_retry, RetryConfig, RetryDecision, RetryableError};
pub use upstream::UpstreamProvider;

use async_trait::async_trait;
use gifhost::{CreatorSearch, Gif, GifSearch, Order, User};
use thiserror::Error;

/// Failures surfaced by a content provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream rate limit hit, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Provider unavailable: {0}")]
    Init(String),
}

impl From<gifhost::Error> for ProviderError {
    fn from(err: gifhost::Error) -> Self {
        match err {
            gifhost::Error::NotFound(what) => ProviderError::NotFound(what),
            gifhost::Error::RateLimited { retry_after } => {
                ProviderError::RateLimited { retry_after }
            }
            other => ProviderError::Upstream(other.to_string()),
        }
    }
}

/// Read-only access to the media host
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Creator profile
    async fn user(&self, username: &str) -> Result<User, ProviderError>;

    /// One page of a creator's GIFs
    async fn user_gifs(
        &self,
        username: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<CreatorSearch, ProviderError>;

    /// One page of keyword search results
    async fn search(
        &self,
        query: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<GifSearch, ProviderError>;

    /// Currently trending GIFs
    async fn trending(&self) -> Result<Vec<Gif>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: ProviderError = gifhost::Error::NotFound("user ghost".to_string()).into();
        assert_eq!(err, ProviderError::NotFound("user ghost".to_string()));

        let err: ProviderError = gifhost::Error::RateLimited { retry_after: 12 }.into();
        assert_eq!(err, ProviderError::RateLimited { retry_after: 12 });

        let err: ProviderError = gifhost::Error::Status {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ProviderError::Upstream(ref m) if m.contains("500")));
    }
}
