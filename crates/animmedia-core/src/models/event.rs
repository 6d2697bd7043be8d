use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Activity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Weekly,
    Monthly,
    Other,
}

/// How much room an event has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Full,
    /// At least 80% taken; the remaining places.
    Limited(u32),
    Available,
}

/// Share of places taken from which an event is shown as limited.
const LIMITED_PERCENT: u64 = 80;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: i64,
    pub activity_id: Option<String>,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`; longer ISO timestamps are accepted and truncated on read.
    pub date: Option<String>,
    /// `HH:MM-HH:MM`.
    pub time: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    pub category: String,
    pub recurring: Option<String>,
    pub recurrence_day: Option<String>,
    pub recurrence_frequency: Option<String>,
    pub current_participants: u32,
    pub max_participants: Option<u32>,
    /// Visitors sign up beforehand; otherwise the event is open access.
    pub registration_required: bool,
    pub icon: Option<String>,

    // Filled in by `DataService` from the matching activity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
    #[serde(rename = "activityName", skip_serializing_if = "Option::is_none")]
    pub activity_name: Option<String>,
}

impl Event {
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Start and end of the `HH:MM-HH:MM` time range.
    pub fn time_range(&self) -> Option<(NaiveTime, NaiveTime)> {
        let (start, end) = self.time.as_deref()?.split_once('-')?;
        let parse = |s: &str| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok();
        Some((parse(start)?, parse(end)?))
    }

    /// On or after `today`. Events without a readable date are not upcoming.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date().map(|d| d >= today).unwrap_or(false)
    }

    pub fn recurrence(&self) -> Option<Recurrence> {
        self.recurring.as_deref().map(|r| match r {
            "weekly" => Recurrence::Weekly,
            "monthly" => Recurrence::Monthly,
            _ => Recurrence::Other,
        })
    }

    pub fn places_left(&self) -> Option<u32> {
        self.max_participants
            .map(|max| max.saturating_sub(self.current_participants))
    }

    /// Events without a participant limit are always available.
    pub fn registration_status(&self) -> RegistrationStatus {
        let Some(max) = self.max_participants else {
            return RegistrationStatus::Available;
        };
        let taken = u64::from(self.current_participants);
        if self.current_participants >= max {
            RegistrationStatus::Full
        } else if taken * 100 >= LIMITED_PERCENT * u64::from(max) {
            RegistrationStatus::Limited(max - self.current_participants)
        } else {
            RegistrationStatus::Available
        }
    }

    pub fn is_full(&self) -> bool {
        self.registration_status() == RegistrationStatus::Full
    }

    /// Sign-up is offered for upcoming events that require it and have room.
    pub fn can_register(&self, today: NaiveDate) -> bool {
        self.registration_required && self.is_upcoming(today) && !self.is_full()
    }
}
