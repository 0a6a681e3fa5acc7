//! SQLite cache store implementation

use super::clock::{Clock, SystemClock};
use crate::{metrics, GifviewError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("gifview");
        path.push("cache.db");

        Self {
            path,
            wal_mode: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Durable key-value store of expiring JSON payloads
///
/// Cloning is cheap; clones share one connection. Every operation holds the
/// connection lock for a single statement (or a read plus a delete), so a
/// reader never sees a half-written entry.
///
/// `get`, `put` and `delete` never fail: storage errors are logged, counted
/// and treated as a miss or a no-op. The `try_*` variants return them.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

struct Inner {
    conn: Mutex<Connection>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    storage_errors: AtomicU64,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("path", &self.inner.config.path)
            .field("clock", &self.inner.clock)
            .field("storage_errors", &self.storage_errors())
            .finish()
    }
}

impl CacheStore {
    /// Open or create a cache database
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Open or create a cache database with a custom time source
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %config.path.display(), "Opening cache database");

        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(config.busy_timeout)?;

        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        init_schema(&conn)?;

        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                config,
                clock,
                storage_errors: AtomicU64::new(0),
            }),
        })
    }

    /// Payload for `key` if present and not expired
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(payload) => payload,
            Err(e) => {
                self.record_failure("get", key, &e);
                None
            }
        }
    }

    /// Insert or replace the entry for `key`, expiring `ttl` from now
    ///
    /// Returns whether the entry was written.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T, ttl: Duration) -> bool {
        match self.try_put(key, payload, ttl) {
            Ok(()) => true,
            Err(e) => {
                self.record_failure("put", key, &e);
                false
            }
        }
    }

    /// Remove the entry for `key` if present
    pub fn delete(&self, key: &str) {
        if let Err(e) = self.try_delete(key) {
            self.record_failure("delete", key, &e);
        }
    }

    /// Fallible form of [`get`](Self::get)
    ///
    /// An entry read at or after its expiry is deleted before returning
    /// `None`. So is a payload that no longer deserializes into `T`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let now = self.now_millis();
        let conn = self.conn();

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT response_data, expires_at FROM api_cache WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, expires_at)) = row else {
            return Ok(None);
        };

        if now >= expires_at {
            conn.execute(
                "DELETE FROM api_cache WHERE cache_key = ?1 AND expires_at <= ?2",
                params![key, now],
            )?;
            tracing::debug!(key = key, "Evicted expired cache entry on read");
            return Ok(None);
        }

        match serde_json::from_str(&data) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) => {
                tracing::warn!(key = key, error = %e, "Discarding unreadable cache entry");
                conn.execute("DELETE FROM api_cache WHERE cache_key = ?1", params![key])?;
                Ok(None)
            }
        }
    }

    /// Fallible form of [`put`](Self::put)
    pub fn try_put<T: Serialize>(&self, key: &str, payload: &T, ttl: Duration) -> Result<()> {
        let ttl_millis = i64::try_from(ttl.as_millis())
            .map_err(|_| GifviewError::Cache(format!("TTL too large: {:?}", ttl)))?;
        if ttl_millis <= 0 {
            return Err(GifviewError::Cache(format!(
                "TTL must be at least one millisecond, got {:?}",
                ttl
            )));
        }

        let data = serde_json::to_string(payload)?;
        let created_at = self.now_millis();
        let expires_at = created_at
            .checked_add(ttl_millis)
            .ok_or_else(|| GifviewError::Cache(format!("TTL too large: {:?}", ttl)))?;

        self.conn().execute(
            r#"
            INSERT INTO api_cache (cache_key, response_data, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(cache_key) DO UPDATE SET
                response_data = excluded.response_data,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
            params![key, data, created_at, expires_at],
        )?;

        tracing::debug!(key = key, ttl_secs = ttl.as_secs(), "Stored cache entry");
        Ok(())
    }

    /// Fallible form of [`delete`](Self::delete)
    pub fn try_delete(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM api_cache WHERE cache_key = ?1", params![key])?;
        Ok(())
    }

    /// Remove every entry whose expiry is strictly before `now`
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM api_cache WHERE expires_at < ?1",
            params![now.timestamp_millis()],
        )?;

        metrics::record_swept(removed);
        if removed > 0 {
            tracing::info!(removed = removed, "Swept expired cache entries");
        } else {
            tracing::debug!("Sweep found no expired cache entries");
        }

        Ok(removed)
    }

    /// Sweep against the store's own clock
    pub fn sweep_expired(&self) -> Result<usize> {
        self.sweep(self.inner.clock.now())
    }

    /// Whether a row exists for `key`, ignoring expiry
    pub fn contains(&self, key: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM api_cache WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<usize> {
        tracing::info!("Clearing cache");
        let removed = self.conn().execute("DELETE FROM api_cache", [])?;
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let now = self.now_millis();
        let conn = self.conn();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM api_cache", [], |row| row.get(0))?;
        let expired: i64 = conn.query_row(
            "SELECT COUNT(*) FROM api_cache WHERE expires_at <= ?1",
            params![now],
            |row| row.get(0),
        )?;
        let oldest_created_at: Option<i64> =
            conn.query_row("SELECT MIN(created_at) FROM api_cache", [], |row| row.get(0))?;

        let total = usize::try_from(total).unwrap_or_default();
        let expired = usize::try_from(expired).unwrap_or_default();

        Ok(CacheStats {
            total_entries: total,
            live_entries: total.saturating_sub(expired),
            expired_entries: expired,
            oldest_created_at: oldest_created_at.and_then(DateTime::from_timestamp_millis),
            storage_errors: self.storage_errors(),
        })
    }

    /// Storage failures absorbed by `get`/`put`/`delete` since opening
    pub fn storage_errors(&self) -> u64 {
        self.inner.storage_errors.load(Ordering::Relaxed)
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn now_millis(&self) -> i64 {
        self.inner.clock.now().timestamp_millis()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection itself usable
        self.inner
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record_failure(&self, op: &str, key: &str, error: &GifviewError) {
        self.inner.storage_errors.fetch_add(1, Ordering::Relaxed);
        metrics::record_storage_error(op);
        tracing::error!(
            op = op,
            key = key,
            error = %error,
            "Cache storage failure, continuing without cache"
        );
    }
}

/// Initialize database schema
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS api_cache (
            cache_key TEXT PRIMARY KEY,
            response_data TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            CHECK (expires_at > created_at)
        );

        CREATE INDEX IF NOT EXISTS idx_api_cache_expires_at ON api_cache(expires_at);
        "#,
    )?;

    Ok(())
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub live_entries: usize,
    pub expired_entries: usize,
    pub oldest_created_at: Option<DateTime<Utc>>,
    pub storage_errors: u64,
}
