//! Provider backed by the live upstream API

use super::retry::{with_retry, RetryConfig};
use super::{ContentProvider, ProviderError};
use async_trait::async_trait;
use gifhost::{Client, ClientConfig, CreatorSearch, Gif, GifSearch, Order, User};

/// [`ContentProvider`] that calls the upstream API through [`gifhost::Client`]
pub struct UpstreamProvider {
    client: Client,
    retry: RetryConfig,
}

impl UpstreamProvider {
    pub fn new(client: Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Build a client and obtain an anonymous token
    pub async fn connect(config: ClientConfig, retry: RetryConfig) -> Result<Self, ProviderError> {
        let client = Client::new(config).map_err(|e| ProviderError::Init(e.to_string()))?;

        with_retry(&retry, "login", || client.login())
            .await
            .map_err(|e| ProviderError::Init(format!("Failed to obtain API token: {}", e)))?;

        tracing::info!(base_url = %client.base_url(), "Connected to upstream API");
        Ok(Self::new(client, retry))
    }
}

#[async_trait]
impl ContentProvider for UpstreamProvider {
    async fn user(&self, username: &str) -> Result<User, ProviderError> {
        let client = &self.client;
        Ok(with_retry(&self.retry, "user_profile", || client.get_user(username)).await?)
    }

    async fn user_gifs(
        &self,
        username: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<CreatorSearch, ProviderError> {
        let client = &self.client;
        Ok(with_retry(&self.retry, "user_gifs", || {
            client.search_creator(username, page, count, order)
        })
        .await?)
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<GifSearch, ProviderError> {
        let client = &self.client;
        Ok(with_retry(&self.retry, "search", || client.search(query, page, count, order)).await?)
    }

    async fn trending(&self) -> Result<Vec<Gif>, ProviderError> {
        let client = &self.client;
        Ok(with_retry(&self.retry, "trending", || client.trending_gifs()).await?)
    }
}
