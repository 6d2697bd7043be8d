//! Data models for the site's JSON documents.
//!
//! - `Event`: an agenda entry, optionally enriched with its `Activity`
//! - `Activity`: a recurring activity of the association
//! - `SiteContent`: `content.json` (activities, events, association)
//! - `SiteConfig`: `config.json` (site identity and colours)
//! - `EventsDocument`: `events.json`, the agenda's own feed

pub mod activity;
pub mod content;
pub mod event;

pub use activity::Activity;
pub use content::{Association, Colors, EventsDocument, SiteConfig, SiteContent, SiteInfo};
pub use event::{Event, Recurrence, RegistrationStatus};
