//! Server configuration file handling
//!
//! Loads and manages the ~/.config/gifview/config.yaml file. Every field has
//! a default, so a missing or partial file is fine.

use crate::cache::{CacheConfig, Operation};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Time-to-live per cached operation, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtls {
    #[serde(default = "default_day_secs")]
    pub user_profile: u64,

    #[serde(default = "default_day_secs")]
    pub user_gifs: u64,

    #[serde(default = "default_day_secs")]
    pub search: u64,

    #[serde(default = "default_trending_secs")]
    pub trending: u64,
}

fn default_day_secs() -> u64 {
    24 * 60 * 60
}

fn default_trending_secs() -> u64 {
    60 * 60
}

impl CacheTtls {
    /// TTL applied when storing a response for `operation`
    pub fn for_operation(&self, operation: Operation) -> Duration {
        let secs = match operation {
            Operation::UserProfile => self.user_profile,
            Operation::UserGifs => self.user_gifs,
            Operation::Search => self.search,
            Operation::Trending => self.trending,
        };
        Duration::from_secs(secs)
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            user_profile: default_day_secs(),
            user_gifs: default_day_secs(),
            search: default_day_secs(),
            trending: default_trending_secs(),
        }
    }
}

/// Cache database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Path to the SQLite database
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Seconds between background sweeps of expired entries
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default)]
    pub ttl: CacheTtls,
}

fn default_cache_path() -> PathBuf {
    CacheConfig::default().path
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    15 * 60
}

fn default_busy_timeout() -> u64 {
    5000
}

impl CacheSection {
    /// Store settings for [`crate::cache::CacheStore::new`]
    pub fn store_config(&self) -> CacheConfig {
        CacheConfig {
            path: self.path.clone(),
            wal_mode: self.wal_mode,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            wal_mode: true,
            sweep_interval_secs: default_sweep_interval(),
            busy_timeout_ms: default_busy_timeout(),
            ttl: CacheTtls::default(),
        }
    }
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per provider call for transient failures (1 disables retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_url() -> String {
    gifhost::DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    gifhost::DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

impl UpstreamSection {
    pub fn client_config(&self) -> gifhost::ClientConfig {
        gifhost::ClientConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Media proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySection {
    /// Hosts media may be fetched from; subdomains of an entry are allowed too
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_allowed_hosts() -> Vec<String> {
    [
        "redgifs.com",
        "userpic.redgifs.com",
        "thumbs2.redgifs.com",
        "thumbs3.redgifs.com",
        "thumbs4.redgifs.com",
        "thumbs44.redgifs.com",
        "thumbs45.redgifs.com",
        "thumbs46.redgifs.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ProxySection {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// gifview configuration
///
/// Represents the complete ~/.config/gifview/config.yaml file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory of frontend files served at `/`
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Send permissive CORS headers
    #[serde(default = "default_true")]
    pub cors: bool,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    #[serde(default)]
    pub proxy: ProxySection,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
            cors: true,
            cache: CacheSection::default(),
            upstream: UpstreamSection::default(),
            proxy: ProxySection::default(),
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::GifviewError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading gifview configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            bind = %config.bind,
            cache = %config.cache.path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving gifview configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/gifview/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("gifview");
        path.push("config.yaml");
        path
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new();
        assert_eq!(config.bind, "0.0.0.0:8000");
        assert!(config.cors);
        assert!(config.static_dir.is_none());
        assert_eq!(config.cache.ttl.trending, 3600);
        assert_eq!(config.cache.ttl.search, 86400);
        assert!(config.cache.path.ends_with("gifview/cache.db"));
    }

    #[test]
    fn test_ttl_per_operation() {
        let ttls = CacheTtls::default();
        assert_eq!(
            ttls.for_operation(Operation::Trending),
            Duration::from_secs(3600)
        );
        assert_eq!(
            ttls.for_operation(Operation::UserProfile),
            Duration::from_secs(86400)
        );
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
bind: "127.0.0.1:9000"
cache:
  ttl:
    trending: 120
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.cache.ttl.trending, 120);
        assert_eq!(config.cache.ttl.user_gifs, 86400);
        assert_eq!(config.cache.sweep_interval_secs, 900);
        assert_eq!(config.upstream.base_url, gifhost::DEFAULT_BASE_URL);
        assert!(config
            .proxy
            .allowed_hosts
            .contains(&"redgifs.com".to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = ServerConfig::new();
        config.static_dir = Some(PathBuf::from("/srv/gifview"));
        config.cache.ttl.search = 600;

        config.save(path).unwrap();
        let loaded = ServerConfig::load(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ServerConfig::load("/nonexistent/config.yaml").is_err());

        let config = ServerConfig::load_or_default("/nonexistent/config.yaml").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_default_path() {
        let path = ServerConfig::default_path();
        assert!(path.ends_with("gifview/config.yaml"));
    }
}
