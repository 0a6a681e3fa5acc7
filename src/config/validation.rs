//! Configuration validation
//!
//! Checks a loaded configuration and reports every problem at once:
//! - Bind address parses
//! - TTLs and intervals are non-zero
//! - Upstream URL is http(s)
//! - Proxy allowlist holds bare host names
//! - Static directory exists when set

use super::server_config::ServerConfig;
use crate::GifviewError;
use std::net::SocketAddr;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub section: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref section) = self.section {
            write!(f, "{}.{}: {}", section, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a gifview configuration
pub fn validate_config(config: &ServerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.bind.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "bind",
            format!("Invalid socket address '{}'", config.bind),
        ));
    }

    if let Some(ref dir) = config.static_dir {
        if !dir.is_dir() {
            errors.push(ValidationError::new(
                "static_dir",
                format!("Not a directory: {}", dir.display()),
            ));
        }
    }

    // Cache
    let ttls = &config.cache.ttl;
    for (field, secs) in [
        ("user_profile", ttls.user_profile),
        ("user_gifs", ttls.user_gifs),
        ("search", ttls.search),
        ("trending", ttls.trending),
    ] {
        if secs == 0 {
            errors.push(
                ValidationError::new(format!("ttl.{}", field), "TTL must be greater than 0")
                    .in_section("cache"),
            );
        }
    }

    if config.cache.sweep_interval_secs == 0 {
        errors.push(
            ValidationError::new("sweep_interval_secs", "Interval must be greater than 0")
                .in_section("cache"),
        );
    }

    if config.cache.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("path", "Path cannot be empty").in_section("cache"));
    }

    // Upstream
    let base_url = &config.upstream.base_url;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(
            ValidationError::new("base_url", format!("Invalid API URL: {}", base_url))
                .in_section("upstream"),
        );
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(
            ValidationError::new("timeout_secs", "Timeout must be greater than 0")
                .in_section("upstream"),
        );
    }

    if config.upstream.max_attempts == 0 {
        errors.push(
            ValidationError::new("max_attempts", "At least one attempt is required")
                .in_section("upstream"),
        );
    }

    // Proxy
    if config.proxy.allowed_hosts.is_empty() {
        errors.push(
            ValidationError::new("allowed_hosts", "At least one host must be allowed")
                .in_section("proxy"),
        );
    }

    for host in &config.proxy.allowed_hosts {
        if !is_bare_host(host) {
            errors.push(
                ValidationError::new(
                    "allowed_hosts",
                    format!("Expected a host name, got '{}'", host),
                )
                .in_section("proxy"),
            );
        }
    }

    if config.proxy.timeout_secs == 0 {
        errors.push(
            ValidationError::new("timeout_secs", "Timeout must be greater than 0")
                .in_section("proxy"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A host name without scheme, port or path
fn is_bare_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && !host.starts_with('.')
        && !host.ends_with('.')
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &ServerConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        GifviewError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
