use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub icon: Option<String>,
    pub schedule: Option<String>,
}
