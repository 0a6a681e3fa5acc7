//! Route handlers

use super::error::ApiError;
use super::params::{parse_username, ListingQuery, SearchQuery};
use super::payload::{SearchPage, TrendingPage, UserGifsPage, UserProfile};
use super::AppState;
use crate::cache::{keys, Operation};
use crate::metrics;
use crate::provider::{ContentProvider, ProviderError};
use crate::proxy::ProxyQuery;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use gifhost::Order;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Serve `key` from the cache, or fetch it, store it and serve it
///
/// Provider failures pass straight through and are never stored.
async fn cached<T, F, Fut>(
    state: &AppState,
    operation: Operation,
    key: String,
    fetch: F,
) -> Result<Json<T>, ApiError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce(Arc<dyn ContentProvider>) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let tag = operation.tag();

    let cache = state.cache.clone();
    let lookup_key = key.clone();
    let hit = tokio::task::spawn_blocking(move || cache.get::<T>(&lookup_key)).await?;

    if let Some(payload) = hit {
        tracing::debug!(key = %key, "Cache hit");
        metrics::record_cache_hit(tag);
        return Ok(Json(payload));
    }

    tracing::debug!(key = %key, "Cache miss");
    metrics::record_cache_miss(tag);

    let provider = state.provider.get().await?;
    let started = Instant::now();
    let result = fetch(provider).await;
    let elapsed = started.elapsed().as_secs_f64();

    let payload = match result {
        Ok(payload) => {
            metrics::record_upstream(tag, "ok", elapsed);
            payload
        }
        Err(e) => {
            let outcome = match e {
                ProviderError::NotFound(_) => "not_found",
                ProviderError::RateLimited { .. } => "rate_limited",
                _ => "error",
            };
            metrics::record_upstream(tag, outcome, elapsed);
            tracing::info!(operation = tag, error = %e, "Upstream call failed");
            return Err(e.into());
        }
    };

    let cache = state.cache.clone();
    let ttl = state.ttls.for_operation(operation);
    let (payload, stored) = tokio::task::spawn_blocking(move || {
        let stored = cache.put(&key, &payload, ttl);
        (payload, stored)
    })
    .await?;
    if stored {
        metrics::record_cache_store(tag);
    }

    Ok(Json(payload))
}

pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let username = parse_username(&username)?;
    let key = keys::user_profile(&username);

    cached(&state, Operation::UserProfile, key, |provider| async move {
        provider.user(&username).await.map(UserProfile::from)
    })
    .await
}

pub async fn user_gifs(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> Result<Json<UserGifsPage>, ApiError> {
    let username = parse_username(&username)?;
    let paging = query_params(query)?.validate(Order::Latest)?;
    let key = keys::user_gifs(&username, paging.page, paging.count, paging.order);

    cached(&state, Operation::UserGifs, key, |provider| async move {
        provider
            .user_gifs(&username, paging.page, paging.count, paging.order)
            .await
            .map(UserGifsPage::from)
    })
    .await
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchPage>, ApiError> {
    let params = query_params(query)?.validate()?;
    let paging = params.paging;
    let key = keys::search(&params.query, paging.page, paging.count, paging.order);

    cached(&state, Operation::Search, key, |provider| async move {
        provider
            .search(&params.query, paging.page, paging.count, paging.order)
            .await
            .map(SearchPage::from)
    })
    .await
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrendingPage>, ApiError> {
    cached(&state, Operation::Trending, keys::trending(), |provider| async move {
        provider.trending().await.map(TrendingPage::from)
    })
    .await
}

pub async fn proxy_media(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let query = query_params(query)?;
    state.proxy.fetch(query.url.as_deref(), &headers).await
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let cache = state.cache.clone();
    let stats = tokio::task::spawn_blocking(move || cache.stats()).await?;

    let body = match stats {
        Ok(stats) => serde_json::json!({
            "status": "ok",
            "cache": stats,
            "provider_initialized": state.provider.is_initialized(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "Cache statistics unavailable");
            serde_json::json!({
                "status": "degraded",
                "cache": null,
                "storage_errors": state.cache.storage_errors(),
                "provider_initialized": state.provider.is_initialized(),
            })
        }
    };

    Ok(Json(body))
}

pub async fn render_metrics() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::encode_metrics().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
