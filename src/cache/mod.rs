//! Response cache
//!
//! SQLite-backed store of expiring JSON payloads, keyed by a deterministic
//! function of the operation and its parameters.

mod clock;
pub mod keys;
mod sqlite;

pub use clock::{Clock, ManualClock, SystemClock};
pub use keys::{cache_key, Operation};
pub use sqlite::{CacheConfig, CacheStats, CacheStore};
