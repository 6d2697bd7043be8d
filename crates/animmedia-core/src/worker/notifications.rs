//! Push notifications shown by the worker and the handling of their clicks.

use serde::Serialize;

pub const NOTIFICATION_TITLE: &str = "Anim'Média";
pub const DEFAULT_BODY: &str = "Nouveau contenu disponible !";
pub const NOTIFICATION_ICON: &str = "/assets/images/icon-192.png";
pub const NOTIFICATION_BADGE: &str = "/assets/images/icon-72.png";
pub const VIBRATION_PATTERN: [u32; 3] = [100, 50, 100];

/// Page opened by the `explore` action.
pub const EXPLORE_URL: &str = "/pages/agenda.html";

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// What the worker does in response to a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Close the notification and open a window on the URL.
    OpenWindow(String),
    /// Close the notification only.
    Dismiss,
}

/// Notification for a push message. A present but empty payload gives an
/// empty body; only a missing payload uses the default text.
pub fn build_push_notification(payload: Option<&str>, now_millis: i64) -> Notification {
    Notification {
        title: NOTIFICATION_TITLE.to_string(),
        options: NotificationOptions {
            body: payload.unwrap_or(DEFAULT_BODY).to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            vibrate: VIBRATION_PATTERN.to_vec(),
            data: NotificationData {
                date_of_arrival: now_millis,
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: "Voir les nouveautés".to_string(),
                    icon: "/assets/images/checkmark.png".to_string(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "Fermer".to_string(),
                    icon: "/assets/images/xmark.png".to_string(),
                },
            ],
        },
    }
}

pub fn handle_notification_click(action: Option<&str>) -> ClickOutcome {
    match action {
        Some(ACTION_EXPLORE) => ClickOutcome::OpenWindow(EXPLORE_URL.to_string()),
        _ => ClickOutcome::Dismiss,
    }
}
