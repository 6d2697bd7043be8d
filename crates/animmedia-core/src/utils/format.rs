use chrono::{Datelike, NaiveDate};

const WEEKDAYS_FR: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

/// Long French date: "dimanche 15 septembre 2024"
pub fn format_date_fr(date: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        WEEKDAYS_FR[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS_FR[date.month0() as usize],
        date.year()
    )
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
