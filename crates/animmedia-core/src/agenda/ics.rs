//! iCalendar export of a single event.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::models::Event;

const PRODUCT_ID: &str = "-//Anim'Media//Events//FR";
const UID_DOMAIN: &str = "anim-media.fr";
const ICS_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Build a `VCALENDAR` holding one `VEVENT`.
///
/// The event's date and `HH:MM-HH:MM` range are read in `offset` (the
/// visitor's local time) and written as UTC. Returns `None` when the event
/// has no usable date or time range.
pub fn create_ics_content(event: &Event, offset: FixedOffset, now: DateTime<Utc>) -> Option<String> {
    let date = event.date()?;
    let (start, end) = event.time_range()?;
    let to_utc = |naive: NaiveDateTime| {
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    };
    let start = to_utc(date.and_time(start))?;
    let end = to_utc(date.and_time(end))?;

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODUCT_ID),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@{}", now.timestamp_millis(), UID_DOMAIN),
        format!("DTSTAMP:{}", now.format(ICS_TIME_FORMAT)),
        format!("DTSTART:{}", start.format(ICS_TIME_FORMAT)),
        format!("DTEND:{}", end.format(ICS_TIME_FORMAT)),
        format!("SUMMARY:{}", escape_text(&event.title)),
        format!("DESCRIPTION:{}", escape_text(&event.description)),
        format!("LOCATION:{}", escape_text(event.location.as_deref().unwrap_or_default())),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    Some(lines.join("\r\n"))
}

/// Download name for an event's calendar file.
pub fn ics_file_name(event: &Event) -> String {
    let stem: String = event
        .title
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == ' ' { c } else { '_' })
        .collect();
    format!("{}.ics", stem.trim())
}

/// RFC 5545 TEXT escaping.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}
