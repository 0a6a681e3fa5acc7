//! Media proxy
//!
//! Stateless passthrough for media files on allowlisted hosts. Nothing is
//! cached server-side; browsers are told to cache for a day.

use crate::config::ProxySection;
use crate::metrics;
use crate::server::ApiError;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Browser caching for every proxied file
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=86400";

const MEDIA_REFERER: &str = "https://www.redgifs.com/";

/// Response headers copied from the origin when present
const FORWARDED_HEADERS: [header::HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ETAG,
    header::LAST_MODIFIED,
];

/// `?url=` query of the proxy routes
#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

const MAX_REDIRECTS: usize = 10;

/// A redirect pointed outside the allowlist
#[derive(Debug, thiserror::Error)]
#[error("Redirect to {0} not allowed")]
struct RedirectBlocked(String);

/// Fetches media from allowlisted hosts on behalf of the browser
#[derive(Debug, Clone)]
pub struct MediaProxy {
    http: reqwest::Client,
    allowed_hosts: Vec<String>,
}

fn host_allowed(allowed_hosts: &[String], host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| {
        host == *allowed
            || host
                .strip_suffix(allowed.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn url_allowed(allowed_hosts: &[String], url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .is_some_and(|host| host_allowed(allowed_hosts, host))
}

impl MediaProxy {
    pub fn new(config: &ProxySection, user_agent: &str) -> crate::Result<Self> {
        let allowed_hosts: Vec<String> = config
            .allowed_hosts
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();

        // Every hop must stay on the allowlist
        let redirect_hosts = allowed_hosts.clone();
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if url_allowed(&redirect_hosts, attempt.url()) {
                attempt.follow()
            } else {
                let target = attempt.url().to_string();
                attempt.error(RedirectBlocked(target))
            }
        });

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(policy)
            .build()?;

        Ok(Self {
            http,
            allowed_hosts,
        })
    }

    /// Whether `host` is an allowlisted host or a subdomain of one
    pub fn is_allowed(&self, host: &str) -> bool {
        host_allowed(&self.allowed_hosts, host)
    }

    /// Parse and authorize the target URL
    pub fn check_url(&self, raw: Option<&str>) -> Result<Url, ApiError> {
        let raw = raw
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Query parameter 'url' is required".to_string()))?;

        let url = Url::parse(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid URL '{}': {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::BadRequest(format!(
                "Unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        match url.host_str() {
            Some(host) if self.is_allowed(host) => Ok(url),
            _ => Err(ApiError::Forbidden("URL not allowed".to_string())),
        }
    }

    /// Fetch `raw` and stream it back, forwarding the client's Range header
    pub async fn fetch(&self, raw: Option<&str>, inbound: &HeaderMap) -> Result<Response, ApiError> {
        let url = match self.check_url(raw) {
            Ok(url) => url,
            Err(e) => {
                metrics::record_proxy("rejected");
                return Err(e);
            }
        };

        let mut request = self.http.get(url.clone()).header(header::REFERER, MEDIA_REFERER);
        if let Some(range) = inbound.get(header::RANGE) {
            request = request.header(header::RANGE, range.clone());
        }

        let upstream = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                if let Some(blocked) = blocked_redirect(&e) {
                    metrics::record_proxy("rejected");
                    tracing::warn!(url = %url, error = %blocked, "Media redirect rejected");
                    return ApiError::Forbidden("URL not allowed".to_string());
                }
                metrics::record_proxy("error");
                tracing::warn!(url = %url, error = %e, "Media fetch failed");
                ApiError::BadGateway(format!("Failed to fetch media: {}", e))
            })?;

        tracing::debug!(url = %url, status = upstream.status().as_u16(), "Proxying media");
        metrics::record_proxy("ok");

        let status = upstream.status();
        let mut builder = Response::builder().status(status);

        if let Some(headers) = builder.headers_mut() {
            for name in FORWARDED_HEADERS {
                if let Some(value) = upstream.headers().get(&name) {
                    headers.insert(name, value.clone());
                }
            }
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/octet-stream"));
            let accept_ranges = upstream
                .headers()
                .get(header::ACCEPT_RANGES)
                .cloned()
                .unwrap_or(HeaderValue::from_static("bytes"));
            headers.insert(header::ACCEPT_RANGES, accept_ranges);
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(MEDIA_CACHE_CONTROL),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }

        builder
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| ApiError::Internal(format!("Failed to build proxy response: {}", e)))
    }
}

fn blocked_redirect(err: &reqwest::Error) -> Option<&RedirectBlocked> {
    if !err.is_redirect() {
        return None;
    }
    std::error::Error::source(err).and_then(|source| source.downcast_ref::<RedirectBlocked>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> MediaProxy {
        MediaProxy::new(&ProxySection::default(), gifhost::DEFAULT_USER_AGENT).unwrap()
    }

    #[test]
    fn test_allowlist_matches_host_and_subdomains() {
        let proxy = proxy();
        assert!(proxy.is_allowed("redgifs.com"));
        assert!(proxy.is_allowed("media.redgifs.com"));
        assert!(proxy.is_allowed("THUMBS2.REDGIFS.COM"));
        assert!(!proxy.is_allowed("evilredgifs.com"));
        assert!(!proxy.is_allowed("redgifs.com.evil.net"));
        assert!(!proxy.is_allowed("example.com"));
    }

    #[test]
    fn test_redirect_targets_checked_against_allowlist() {
        let hosts = vec!["redgifs.com".to_string()];
        let ok = Url::parse("https://media.redgifs.com/a.mp4").unwrap();
        assert!(url_allowed(&hosts, &ok));
        let foreign = Url::parse("http://localhost:8080/secret").unwrap();
        assert!(!url_allowed(&hosts, &foreign));
        let scheme = Url::parse("file:///etc/passwd").unwrap();
        assert!(!url_allowed(&hosts, &scheme));
    }

    #[test]
    fn test_check_url() {
        let proxy = proxy();

        let ok = proxy
            .check_url(Some("https://thumbs44.redgifs.com/Cat.jpg"))
            .unwrap();
        assert_eq!(ok.host_str(), Some("thumbs44.redgifs.com"));

        assert!(matches!(proxy.check_url(None), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            proxy.check_url(Some("not a url")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            proxy.check_url(Some("ftp://redgifs.com/a")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            proxy.check_url(Some("https://example.com/a.mp4")),
            Err(ApiError::Forbidden(_))
        ));
    }
}
