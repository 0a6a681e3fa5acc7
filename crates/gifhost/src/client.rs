//! HTTP client for the upstream API

use crate::types::{CreatorSearch, Gif, GifSearch, Order, TemporaryToken, TrendingGifs, User, UserEnvelope};
use crate::{Error, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;

/// Public API host
pub const DEFAULT_BASE_URL: &str = "https://api.redgifs.com";

/// Browser user agent; the API refuses obviously scripted clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

/// Site origin sent with every request
pub const SITE_ORIGIN: &str = "https://www.redgifs.com";

/// Temporary tokens are valid for a day; refresh an hour early
const TOKEN_LIFETIME_HOURS: i64 = 23;

/// Attempts per request when the upstream answers 401
const AUTH_ATTEMPTS: u32 = 3;

/// Used when a 429 carries no usable Retry-After header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Upper bound on error bodies echoed back in [`Error::Status`]
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Creator listings are restricted to animated media
const GIF_MEDIA_TYPE: &str = "g";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.redgifs.com`
    pub base_url: String,

    /// User-Agent header for every request
    pub user_agent: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
struct Token {
    value: String,
    session_id: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Token {
    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Async client for the upstream media API
///
/// Holds an anonymous bearer token obtained from `/v2/auth/temporary` and
/// refreshes it transparently when it expires or the API rejects it.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<Token>>,
}

impl Client {
    /// Create a client; no network traffic happens until the first request
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(config.base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://www.redgifs.com/"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Create a client with default settings
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Obtain a fresh temporary token, replacing any cached one
    pub async fn login(&self) -> Result<()> {
        self.bearer(true).await.map(|_| ())
    }

    /// Whether a non-expired token is currently cached
    pub async fn has_token(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .map(Token::is_fresh)
            .unwrap_or(false)
    }

    /// Fetch a creator profile
    pub async fn get_user(&self, username: &str) -> Result<User> {
        let path = format!("/v1/users/{}", urlencoding::encode(username));
        let envelope: UserEnvelope = self
            .get_json(&path, &[], &format!("user {}", username))
            .await?;
        Ok(envelope.into())
    }

    /// List a creator's GIFs
    pub async fn search_creator(
        &self,
        username: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<CreatorSearch> {
        let path = format!("/v2/users/{}/search", urlencoding::encode(username));
        let query = [
            ("order", order.as_str().to_string()),
            ("count", count.to_string()),
            ("page", page.to_string()),
            ("type", GIF_MEDIA_TYPE.to_string()),
        ];
        self.get_json(&path, &query, &format!("creator {}", username))
            .await
    }

    /// Search GIFs by tag or keyword
    pub async fn search(
        &self,
        text: &str,
        page: u32,
        count: u32,
        order: Order,
    ) -> Result<GifSearch> {
        let query = [
            ("search_text", text.to_string()),
            ("order", order.as_str().to_string()),
            ("count", count.to_string()),
            ("page", page.to_string()),
        ];
        let mut result: GifSearch = self
            .get_json("/v2/gifs/search", &query, &format!("search {}", text))
            .await?;

        if result.searched_for.is_none() {
            result.searched_for = Some(text.to_string());
        }
        Ok(result)
    }

    /// Currently trending GIFs
    pub async fn trending_gifs(&self) -> Result<Vec<Gif>> {
        let result: TrendingGifs = self
            .get_json("/v2/explore/trending-gifs", &[], "trending gifs")
            .await?;
        Ok(result.gifs)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidBaseUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    /// Cached token, or a freshly fetched one when missing, stale or forced
    async fn bearer(&self, force_refresh: bool) -> Result<Token> {
        if !force_refresh {
            if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.clone());
            }
        }

        let mut guard = self.token.write().await;

        // Another request may have refreshed while we waited for the lock
        if !force_refresh {
            if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.clone());
            }
        }

        let session_id = guard.as_ref().and_then(|t| t.session_id.clone());
        let token = self.fetch_token(session_id).await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn fetch_token(&self, session_id: Option<String>) -> Result<Token> {
        let url = self.endpoint("/v2/auth/temporary")?;

        let mut request = self.http.get(url);
        if let Some(session) = session_id {
            request = request.query(&[("session_id", session)]);
        }

        let response = request.send().await?;
        let temporary: TemporaryToken = decode(response, "temporary token").await?;

        tracing::info!("Obtained temporary upstream access token");

        Ok(Token {
            value: temporary.token,
            session_id: temporary.session,
            expires_at: Utc::now() + ChronoDuration::hours(TOKEN_LIFETIME_HOURS),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let mut attempt = 0;

        loop {
            let token = self.bearer(attempt > 0).await?;

            let mut request = self
                .http
                .get(url.clone())
                .query(query)
                .bearer_auth(&token.value);
            if let Some(session) = &token.session_id {
                request = request.header("X-Session-Id", session);
            }

            let response = request.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED && attempt + 1 < AUTH_ATTEMPTS {
                attempt += 1;
                tracing::debug!(path = path, attempt = attempt, "Token rejected, refreshing");
                continue;
            }

            tracing::debug!(path = path, status = response.status().as_u16(), "Upstream response");
            return decode(response, resource).await;
        }
    }
}

/// Turn an upstream response into a typed record or a classified error
async fn decode<T: DeserializeOwned>(response: reqwest::Response, resource: &str) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        return Ok(serde_json::from_slice(&body)?);
    }

    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound(resource.to_string())),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(Error::RateLimited { retry_after })
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(Error::Status {
                status: status.as_u16(),
                message: error_message(&text),
            })
        }
    }
}

/// Best-effort human message from an error body
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.pointer("/error/message"),
            value.pointer("/message"),
            value.pointer("/error/description"),
            value.pointer("/error"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(message) = candidate.as_str() {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}
