//! Offline core for the Anim'Média association site.
//!
//! The crate provides the pieces a static site needs to keep working without
//! a network connection:
//!
//! - `worker`: the resource cache controller (install / activate /
//!   network-first fetch / push notifications) running behind an actor
//! - `cache`: `SmartCache`, a TTL key/value cache over local storage
//! - `analytics`: a local-only event recorder with weekly statistics
//! - `data` and `agenda`: loading, enriching and querying the site's events
//! - `site`: form validation and cookie consent
//!
//! Every component takes its storage, fetcher and clock explicitly; there are
//! no global instances.

pub mod agenda;
pub mod analytics;
pub mod cache;
pub mod clock;
pub mod data;
pub mod models;
pub mod site;
pub mod storage;
pub mod utils;
pub mod worker;

pub use analytics::{Analytics, AnalyticsStats};
pub use cache::SmartCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use data::DataService;
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
pub use worker::{spawn_worker, ResourceCacheController, WorkerHandle};
