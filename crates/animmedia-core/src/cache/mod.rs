//! Local key/value caching for fetched payloads.
//!
//! `SmartCache` memoizes JSON-serializable values in local storage under
//! `<cacheName>_<key>`, each stamped with the time it was stored and its TTL.
//! Expiry is checked lazily: an expired entry is removed by the `get` that
//! finds it, and nothing sweeps storage in the background.

pub mod smart;

pub use smart::{CacheEntry, SmartCache, DEFAULT_CACHE_NAME, DEFAULT_TTL};
