//! The resource cache controller (service worker) and its seams.
//!
//! - `ResourceCacheController`: install / activate / network-first fetch
//! - `spawn_worker` / `WorkerHandle`: the actor boundary around it
//! - `Fetcher` / `HttpFetcher`: network access
//! - `CacheStorage` / `MemoryCacheStorage` / `DiskCacheStorage`: named buckets
//!   of cached responses
//! - `notifications`: push display and click handling

pub mod actor;
pub mod cache_storage;
pub mod controller;
pub mod disk;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod notifications;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::{spawn_worker, WorkerHandle, WorkerMessage};
pub use cache_storage::{CacheStorage, MemoryCacheStorage};
pub use controller::{
    LifecycleState, ResourceCacheController, WorkerSettings, APP_SHELL, CACHE_VERSION,
    FALLBACK_DOCUMENT,
};
pub use disk::DiskCacheStorage;
pub use error::{CacheStorageError, FetchError, WorkerError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use http::{Destination, Method, Request, Response};
pub use notifications::{ClickOutcome, Notification};
