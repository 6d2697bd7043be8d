//! Loading and querying the site's content.
//!
//! `DataService` fetches `content.json` and `config.json` (normally through
//! the worker, so it keeps working offline), memoizes the parsed documents in
//! `SmartCache`, and answers the queries the pages make: events by category,
//! upcoming events, activity and event lookup.

pub mod error;
pub mod fallback;
pub mod optimize;
pub mod service;

pub use error::DataError;
pub use optimize::optimize_event_data;
pub use service::{DataService, CONFIG_URL, CONTENT_URL};
