//! In-memory TTL cache used for read-through caching of API responses.
//!
//! Every entry gets the same time-to-live, fixed when the cache is built.
//! Expiry is lazy: a stale entry is treated as absent by [`TtlCache::get`]
//! and is only physically removed by [`TtlCache::clean_expired`], a later
//! [`TtlCache::set`] for the same key, or an explicit delete/clear.
//!
//! # Example
//!
//! ```
//! use incidentio_cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache = TtlCache::new(Duration::from_secs(300));
//! cache.set("severities:list", "payload".to_string());
//!
//! assert_eq!(cache.get("severities:list"), Some("payload".to_string()));
//! assert_eq!(cache.get("severity:unknown"), None);
//! ```

mod store;

pub use store::{CacheEntry, TtlCache};
