use crate::models::{Event, Recurrence};

/// Background for unknown categories.
const DEFAULT_COLOR: &str = "#E8E8E8";
const DEFAULT_ICON: &str = "📅";

/// Alpha suffix applied to category colours (~12% opacity).
const COLOR_ALPHA: &str = "20";

/// Translucent badge colour for a category.
pub fn category_color(category: &str) -> String {
    let base = match category {
        "numérique" => "#4682B4",
        "cuisine" => "#F4A460",
        "spectacle" => "#9370DB",
        "montessori" => "#FF69B4",
        "écriture" => "#32CD32",
        "sortie" => "#FF6347",
        _ => return DEFAULT_COLOR.to_string(),
    };
    format!("{}{}", base, COLOR_ALPHA)
}

pub fn category_icon(category: &str) -> &'static str {
    match category {
        "numérique" => "💻",
        "cuisine" => "🥞",
        "spectacle" => "🎭",
        "montessori" => "🧸",
        "écriture" => "✍️",
        "sortie" => "🚌",
        _ => DEFAULT_ICON,
    }
}

/// Display label, or the category itself when unknown.
pub fn category_name(category: &str) -> &str {
    match category {
        "numérique" => "Café numérique",
        "cuisine" => "Atelier cuisine",
        "spectacle" => "Spectacle",
        "montessori" => "Montessori",
        "écriture" => "Atelier écriture",
        "sortie" => "Sortie culturelle",
        other => other,
    }
}

pub fn recurrence_text(event: &Event) -> String {
    match event.recurrence() {
        Some(Recurrence::Weekly) => format!(
            "Tous les {}s",
            event.recurrence_day.as_deref().unwrap_or_default()
        ),
        Some(Recurrence::Monthly) => event
            .recurrence_frequency
            .clone()
            .unwrap_or_else(|| "Mensuel".to_string()),
        _ => "Récurrent".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_categories() {
        assert_eq!(category_color("cuisine"), "#F4A46020");
        assert_eq!(category_color("jardinage"), "#E8E8E8");
        assert_eq!(category_icon("sortie"), "🚌");
        assert_eq!(category_icon("jardinage"), "📅");
        assert_eq!(category_name("écriture"), "Atelier écriture");
        assert_eq!(category_name("jardinage"), "jardinage");
    }

    #[test]
    fn test_recurrence_text() {
        let weekly = Event {
            recurring: Some("weekly".to_string()),
            recurrence_day: Some("mercredi".to_string()),
            ..Event::default()
        };
        assert_eq!(recurrence_text(&weekly), "Tous les mercredis");

        let monthly = Event {
            recurring: Some("monthly".to_string()),
            ..Event::default()
        };
        assert_eq!(recurrence_text(&monthly), "Mensuel");

        let first_saturday = Event {
            recurring: Some("monthly".to_string()),
            recurrence_frequency: Some("Le premier samedi du mois".to_string()),
            ..Event::default()
        };
        assert_eq!(recurrence_text(&first_saturday), "Le premier samedi du mois");
        assert_eq!(recurrence_text(&Event::default()), "Récurrent");
    }
}
