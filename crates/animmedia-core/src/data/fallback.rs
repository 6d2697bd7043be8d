//! Content used when the real documents cannot be loaded.

use chrono::NaiveDate;

use crate::models::{Activity, Association, Colors, Event, SiteConfig, SiteContent, SiteInfo};

const SITE_NAME: &str = "Anim'Média";
const SITE_DESCRIPTION: &str = "Association culturelle et numérique";

/// One activity and one event dated `today`, so the pages still render.
pub fn fallback_content(today: NaiveDate) -> SiteContent {
    SiteContent {
        activities: vec![Activity {
            id: "cafe-numerique".to_string(),
            name: "Café numérique".to_string(),
            category: "numérique".to_string(),
            description: "Accompagnement numérique personnalisé".to_string(),
            icon: Some("💻".to_string()),
            schedule: None,
        }],
        events: vec![Event {
            id: 1,
            activity_id: Some("cafe-numerique".to_string()),
            title: "Café numérique".to_string(),
            description: "Venez avec vos questions numériques !".to_string(),
            date: Some(today.format("%Y-%m-%d").to_string()),
            category: "numérique".to_string(),
            icon: Some("💻".to_string()),
            ..Event::default()
        }],
        association: Association {
            name: SITE_NAME.to_string(),
            description: SITE_DESCRIPTION.to_string(),
            ..Association::default()
        },
    }
}

pub fn fallback_config() -> SiteConfig {
    SiteConfig {
        site: SiteInfo {
            name: SITE_NAME.to_string(),
            description: SITE_DESCRIPTION.to_string(),
        },
        colors: Colors {
            primary: "#2E7D32".to_string(),
            secondary: "#FF7043".to_string(),
            accent: "#1976D2".to_string(),
        },
        ..SiteConfig::default()
    }
}
