//! Lazily-initialized shared provider

use super::retry::RetryConfig;
use super::{ContentProvider, ProviderError, UpstreamProvider};
use crate::config::UpstreamSection;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Factory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn ContentProvider>, ProviderError>> + Send + Sync>;

/// Process-wide provider, built on first use
///
/// Concurrent first callers wait on a single run of the factory. If the
/// factory fails, nothing is stored and the next caller tries again.
pub struct ProviderHandle {
    cell: OnceCell<Arc<dyn ContentProvider>>,
    factory: Factory,
}

impl ProviderHandle {
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ContentProvider>, ProviderError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(move || factory().boxed()),
        }
    }

    /// Handle around an already-built provider
    pub fn ready(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(provider)),
            factory: Box::new(|| {
                async {
                    Err::<Arc<dyn ContentProvider>, _>(ProviderError::Init(
                        "provider was supplied pre-built".to_string(),
                    ))
                }
                .boxed()
            }),
        }
    }

    /// Handle that connects to the upstream API on first use
    pub fn upstream(config: &UpstreamSection) -> Self {
        let client_config = config.client_config();
        let retry = RetryConfig::with_attempts(config.max_attempts);

        Self::new(move || {
            let client_config = client_config.clone();
            let retry = retry.clone();
            async move {
                let provider = UpstreamProvider::connect(client_config, retry).await?;
                Ok(Arc::new(provider) as Arc<dyn ContentProvider>)
            }
        })
    }

    /// The provider, building it if this is the first call
    pub async fn get(&self) -> Result<Arc<dyn ContentProvider>, ProviderError> {
        let provider = self
            .cell
            .get_or_try_init(|| async {
                tracing::debug!("Initializing content provider");
                let result = (self.factory)().await;
                if let Err(ref e) = result {
                    tracing::error!(error = %e, "Content provider initialization failed");
                }
                result
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
