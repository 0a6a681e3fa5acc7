//! HTTP server
//!
//! Re-exposes the upstream API with every read memoized in the cache store.
//!
//! # Routes
//!
//! - `GET /api/user/{username}` - Creator profile
//! - `GET /api/user/{username}/gifs?page&count&order` - Creator's GIFs
//! - `GET /api/search?q&page&count&order` - Keyword search
//! - `GET /api/trending` - Trending GIFs
//! - `GET /proxy?url=` and `GET /api/media?url=` - Media passthrough (uncached)
//! - `GET /health` - Liveness and cache statistics
//! - `GET /metrics` - Prometheus metrics
//! - anything else - static frontend files, when a directory is configured
//!
//! # Example
//!
//! ```no_run
//! use gifview::config::ServerConfig;
//! use gifview::server::GifviewServer;
//!
//! #[tokio::main]
//! async fn main() -> gifview::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = GifviewServer::from_config(&config)?;
//!     server.run("127.0.0.1:8000", std::future::pending()).await
//! }
//! ```

mod error;
mod handlers;
pub mod params;
pub mod payload;

pub use error::{ApiError, ErrorResponse};

use crate::cache::CacheStore;
use crate::config::{CacheTtls, ServerConfig};
use crate::provider::ProviderHandle;
use crate::proxy::MediaProxy;
use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Router,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Shared server state
pub struct AppState {
    pub cache: CacheStore,
    pub provider: Arc<ProviderHandle>,
    pub ttls: CacheTtls,
    pub proxy: MediaProxy,
}

/// Router settings that do not live in [`AppState`]
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub cors: bool,
    pub static_dir: Option<PathBuf>,
}

impl RouterOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            cors: config.cors,
            static_dir: config.static_dir.clone(),
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let mut app = Router::new()
        .route("/api/user/{username}", get(handlers::user_profile))
        .route("/api/user/{username}/gifs", get(handlers::user_gifs))
        .route("/api/search", get(handlers::search))
        .route("/api/trending", get(handlers::trending))
        .route("/api/media", get(handlers::proxy_media))
        .route("/api/{*rest}", any(handlers::not_found))
        .route("/proxy", get(handlers::proxy_media))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::render_metrics));

    app = match options.static_dir {
        Some(ref dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(handlers::not_found),
    };

    let mut app = app.layer(middleware::from_fn(log_requests));
    if options.cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

/// HTTP server for gifview
pub struct GifviewServer {
    state: Arc<AppState>,
    options: RouterOptions,
}

impl GifviewServer {
    pub fn new(state: AppState, options: RouterOptions) -> Self {
        Self {
            state: Arc::new(state),
            options,
        }
    }

    /// Open the cache and prepare the upstream provider and media proxy
    ///
    /// The provider connects lazily on the first request that misses the cache.
    pub fn from_config(config: &ServerConfig) -> crate::Result<Self> {
        let cache = CacheStore::new(config.cache.store_config())?;
        let proxy = MediaProxy::new(&config.proxy, &config.upstream.user_agent)?;

        Ok(Self::new(
            AppState {
                cache,
                provider: Arc::new(ProviderHandle::upstream(&config.upstream)),
                ttls: config.cache.ttl.clone(),
                proxy,
            },
            RouterOptions::from_config(config),
        ))
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn router(&self) -> Router {
        router(self.state.clone(), &self.options)
    }

    /// Serve on `addr` until `shutdown` completes
    pub async fn run<F>(self, addr: &str, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            crate::GifviewError::Config(format!("Failed to bind {}: {}", addr, e))
        })?;

        tracing::info!(
            addr = addr,
            cache = %self.state.cache.path().display(),
            static_dir = ?self.options.static_dir,
            cors = self.options.cors,
            "gifview listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Log every request with its status and latency
async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    if let Some(query) = request.uri().query() {
        tracing::debug!(method = %method, path = %path, query = query, "Request received");
    }

    let started = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );

    response
}
