use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Activity, Event};

/// `content.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteContent {
    pub activities: Vec<Activity>,
    pub events: Vec<Event>,
    pub association: Association,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Association {
    pub name: String,
    pub description: String,
    /// Address, contacts and anything else the page displays as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `config.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteInfo,
    pub colors: Colors,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// `events.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsDocument {
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_tolerates_missing_sections() {
        let content: SiteContent = serde_json::from_str(r#"{"events": []}"#).unwrap();
        assert!(content.activities.is_empty());
        assert_eq!(content.association, Association::default());
    }

    #[test]
    fn test_association_keeps_extra_fields() {
        let content: SiteContent = serde_json::from_str(
            r#"{"association": {"name": "Anim'Média", "address": "1 place de la Mairie"}}"#,
        )
        .unwrap();
        assert_eq!(content.association.name, "Anim'Média");
        assert_eq!(content.association.extra["address"], "1 place de la Mairie");
    }
}
