//! Local-only analytics.
//!
//! `Analytics` records named events with the page they happened on and a
//! per-instance session id. Events never leave the device: they are appended
//! to a single local-storage key (`analytics`) holding the 1000 most recent
//! events, from which `stats()` derives a weekly summary.

pub mod recorder;
pub mod stats;

pub use recorder::{Analytics, AnalyticsError, AnalyticsEvent, ANALYTICS_KEY, MAX_STORED_EVENTS};
pub use stats::{AnalyticsStats, PageVisits, STATS_WINDOW_MILLIS};
