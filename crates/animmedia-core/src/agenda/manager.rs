use chrono::NaiveDate;
use serde::de::Error as _;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::DataError;
use crate::models::{Event, EventsDocument};
use crate::worker::{Fetcher, Request};

/// Feed read by the agenda page.
pub const EVENTS_URL: &str = "/data/events.json";

const ALL: &str = "all";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("No event with id {0}")]
    UnknownEvent(i64),

    #[error("Event {0} is over")]
    Past(i64),

    #[error("Event {0} is full")]
    Full(i64),

    #[error("Event {0} is open access, no registration needed")]
    NotRequired(i64),
}

/// Agenda state: events sorted by date and the active category filter.
#[derive(Debug, Clone, Default)]
pub struct Agenda {
    events: Vec<Event>,
    current_filter: String,
}

impl Agenda {
    /// Events sorted by date; undated events go last, in their original order.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| (e.date().is_none(), e.date()));
        Self {
            events,
            current_filter: ALL.to_string(),
        }
    }

    /// Load `events.json` through `fetcher`.
    pub async fn load(fetcher: &dyn Fetcher) -> Result<Self, DataError> {
        let response = fetcher
            .fetch(&Request::get(EVENTS_URL))
            .await
            .map_err(|source| DataError::Fetch {
                url: EVENTS_URL.to_string(),
                source,
            })?;
        if !response.is_ok() {
            return Err(DataError::Status {
                url: EVENTS_URL.to_string(),
                status: response.status,
            });
        }
        let parse_error = |source: serde_json::Error| DataError::Parse {
            url: EVENTS_URL.to_string(),
            source,
        };
        let value: Value = response.json().map_err(parse_error)?;
        if !value.is_object() {
            return Err(parse_error(serde_json::Error::custom(
                "events feed must be a JSON object",
            )));
        }
        let document: EventsDocument = serde_json::from_value(value).map_err(parse_error)?;

        info!(events = document.events.len(), "Agenda loaded");
        Ok(Self::from_events(document.events))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn current_filter(&self) -> &str {
        &self.current_filter
    }

    /// Select a category (`"all"` clears the filter) and return the matches.
    pub fn filter(&mut self, category: &str) -> Vec<&Event> {
        debug!(category, "Agenda filter changed");
        self.current_filter = category.to_string();
        self.filtered()
    }

    /// Events matching the current filter, in date order.
    pub fn filtered(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| self.current_filter == ALL || e.category == self.current_filter)
            .collect()
    }

    pub fn event(&self, event_id: i64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    /// Count one more participant for an upcoming event that takes
    /// registrations and has room left. Returns the updated event.
    pub fn register(
        &mut self,
        event_id: i64,
        today: NaiveDate,
    ) -> Result<&Event, RegistrationError> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(RegistrationError::UnknownEvent(event_id))?;
        if !event.is_upcoming(today) {
            return Err(RegistrationError::Past(event_id));
        }
        if event.is_full() {
            return Err(RegistrationError::Full(event_id));
        }
        if !event.registration_required {
            return Err(RegistrationError::NotRequired(event_id));
        }

        event.current_participants += 1;
        info!(
            event = event_id,
            participants = event.current_participants,
            "Registration recorded"
        );
        Ok(&*event)
    }
}
