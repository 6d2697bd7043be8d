//! The agenda page's logic without its markup.
//!
//! `Agenda` holds the events from `events.json` sorted by date, applies the
//! category filter, and records registrations. `category` maps categories to
//! their colour, icon and label; `ics` exports an event to iCalendar.

pub mod category;
pub mod ics;
pub mod manager;

pub use category::{category_color, category_icon, category_name, recurrence_text};
pub use ics::{create_ics_content, ics_file_name};
pub use manager::{Agenda, RegistrationError, EVENTS_URL};
