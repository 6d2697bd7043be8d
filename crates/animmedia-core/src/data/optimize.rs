use chrono::NaiveDate;

use crate::models::Event;

const DEFAULT_CATEGORY: &str = "autre";

/// Normalize events for display: trimmed descriptions, `YYYY-MM-DD` dates,
/// lowercase categories (`autre` when missing). Events without a title or a
/// readable date are dropped.
pub fn optimize_event_data(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter_map(|mut event| {
            event.description = event.description.trim().to_string();
            event.date = event.date().map(|d: NaiveDate| d.format("%Y-%m-%d").to_string());
            event.category = if event.category.trim().is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                event.category.trim().to_lowercase()
            };

            if event.title.is_empty() || event.date.is_none() {
                None
            } else {
                Some(event)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, date: Option<&str>, category: &str, description: &str) -> Event {
        Event {
            title: title.to_string(),
            date: date.map(str::to_string),
            category: category.to_string(),
            description: description.to_string(),
            ..Event::default()
        }
    }

    #[test]
    fn test_normalizes_fields() {
        let events = optimize_event_data(vec![event(
            "Spectacle",
            Some("2024-09-22T15:00:00Z"),
            "Spectacle",
            "  Jeune public \n",
        )]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date.as_deref(), Some("2024-09-22"));
        assert_eq!(events[0].category, "spectacle");
        assert_eq!(events[0].description, "Jeune public");
    }

    #[test]
    fn test_missing_category_becomes_autre() {
        let events = optimize_event_data(vec![event("Vide-grenier", Some("2024-10-01"), "", "")]);
        assert_eq!(events[0].category, "autre");
    }

    #[test]
    fn test_drops_untitled_or_undated() {
        let events = optimize_event_data(vec![
            event("", Some("2024-10-01"), "sortie", ""),
            event("Sans date", None, "sortie", ""),
            event("Date illisible", Some("bientôt"), "sortie", ""),
            event("Sortie musée", Some("2024-10-05"), "sortie", ""),
        ]);
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Sortie musée"]);
    }
}
